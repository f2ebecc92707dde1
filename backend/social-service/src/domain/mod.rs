pub mod models;
pub mod paths;

pub use models::*;
pub use paths::{fields, Paths};
