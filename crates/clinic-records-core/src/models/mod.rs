//! Domain models for clinic patient records.

mod data_field;
mod flat;
mod patient;

pub use data_field::*;
pub use flat::*;
pub use patient::*;
