pub mod marker;
pub mod order;
pub mod point;
pub mod tick;
pub mod timestamp;
