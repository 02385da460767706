//! Navigation types and utilities
//!
//! Great-circle math, geographic types and heading source selection.

pub mod geo;
pub mod heading;
mod types;

pub use geo::{
    checked_bearing, circular_delta, haversine_distance_km, initial_bearing, wrap_180, wrap_360,
};
pub use heading::{HeadingSource, HeadingSourceType, SensorCapabilities};
pub use types::{Bearing, GeoError, GeoPoint, KAABA};
