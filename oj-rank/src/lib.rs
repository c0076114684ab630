pub mod aggregate;
pub mod data_processing;
pub mod error;
pub mod summary;
pub mod systems;

pub use aggregate::{Aggregation, InvariantViolation, aggregate};
pub use error::Error;
