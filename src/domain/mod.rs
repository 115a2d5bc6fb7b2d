//! Domain value types and input validation.

pub mod input;
mod nutrient;

pub use nutrient::Nutrient;
