//! Core types and constants for the geolocation layer

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
