//! Core types used across the Payment Network kit.

mod field;
pub mod field_names;
mod response_code;

pub use field::*;
pub use response_code::*;
