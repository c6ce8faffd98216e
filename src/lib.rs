pub mod backend;
pub mod chart;
pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod model;
pub mod session;
pub mod ui;
