//! Navigation type definitions
//!
//! This module contains core geographic types:
//! - `GeoPoint`: A position from a location fix
//! - `Bearing`: A target direction in `[0, 360)` degrees
//! - `GeoError`: Geometric edge cases

use super::geo::wrap_360;

/// Geographic position from a location fix
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to +90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to +180)
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Position of the Kaaba, the default compass target.
pub const KAABA: GeoPoint = GeoPoint::new(21.4225, 39.8262);

/// Compass direction, 0 = north, clockwise.
///
/// Always stored normalized to `[0, 360)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bearing {
    degrees: f32,
}

impl Bearing {
    /// North (0°)
    pub const NORTH: Bearing = Bearing { degrees: 0.0 };

    /// Create a bearing, normalizing the input to `[0, 360)`
    pub fn new(degrees: f32) -> Self {
        Self {
            degrees: wrap_360(degrees),
        }
    }

    /// Bearing in degrees, `[0, 360)`
    pub fn degrees(&self) -> f32 {
        self.degrees
    }
}

/// Geometric edge cases from great-circle math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoError {
    /// Source and target coincide; no direction exists
    UndefinedBearing,
}

impl GeoError {
    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoError::UndefinedBearing => "UndefinedBearing",
        }
    }
}

impl core::fmt::Display for GeoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GeoError::UndefinedBearing => write!(f, "bearing undefined for coincident points"),
        }
    }
}
