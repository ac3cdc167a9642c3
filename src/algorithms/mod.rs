//! Geodetic algorithms

pub mod distance;

pub use distance::{distance, haversine_distance, vincenty_distance};
