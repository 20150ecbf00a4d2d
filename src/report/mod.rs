//! Report datasets and the view models derived from them.

pub mod dataset;
pub mod series;
pub mod views;
