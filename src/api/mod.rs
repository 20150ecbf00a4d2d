pub mod errors;
pub mod views;
