pub mod rest;
pub mod types;
