//! Great-circle math and angle helpers
//!
//! Pure functions for bearing and distance between two points on a sphere,
//! plus the circular arithmetic used everywhere headings are combined.
//! Geographic math runs in `f64`; sensor-side angles are `f32`.

use libm::{atan2, cos, sin, sqrt};

use super::types::{Bearing, GeoError, GeoPoint};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Angular separation (radians) below which two points are treated as coincident.
const COINCIDENT_EPSILON_RAD: f64 = 1e-9;

/// Normalize an angle to `[0, 360)` degrees.
pub fn wrap_360(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a < 0.0 {
        a += 360.0;
    }
    // -1e-7 % 360 + 360 rounds up to exactly 360.0 in f32
    if a >= 360.0 {
        a = 0.0;
    }
    a
}

/// Normalize an angle to `(-180, 180]` degrees.
pub fn wrap_180(angle: f32) -> f32 {
    let a = wrap_360(angle);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}

/// Signed shortest-path difference `to - from`, in `(-180, 180]` degrees.
///
/// Positive means `to` lies clockwise of `from`.
pub fn circular_delta(to: f32, from: f32) -> f32 {
    wrap_180(to - from)
}

/// Initial great-circle bearing from `from` toward `to`.
///
/// # Preconditions
///
/// `from` and `to` must not coincide. The bearing is mathematically undefined
/// there; this function then returns the stable sentinel 0° (north). Use
/// [`checked_bearing`] to detect that case.
pub fn initial_bearing(from: GeoPoint, to: GeoPoint) -> Bearing {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = sin(delta_lon) * cos(lat2);
    let x = cos(lat1) * sin(lat2) - sin(lat1) * cos(lat2) * cos(delta_lon);
    if y == 0.0 && x == 0.0 {
        return Bearing::NORTH;
    }

    Bearing::new(atan2(y, x).to_degrees() as f32)
}

/// Initial bearing that rejects coincident points.
pub fn checked_bearing(from: GeoPoint, to: GeoPoint) -> Result<Bearing, GeoError> {
    if central_angle(from, to) < COINCIDENT_EPSILON_RAD {
        return Err(GeoError::UndefinedBearing);
    }
    Ok(initial_bearing(from, to))
}

/// Great-circle distance in kilometers (haversine, R = 6371 km).
pub fn haversine_distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    EARTH_RADIUS_KM * central_angle(from, to)
}

/// Central angle between two points in radians.
fn central_angle(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let sin_dlat = sin(delta_lat / 2.0);
    let sin_dlon = sin(delta_lon / 2.0);
    let a = sin_dlat * sin_dlat + cos(lat1) * cos(lat2) * sin_dlon * sin_dlon;
    // Rounding can push `a` marginally above 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    2.0 * atan2(sqrt(a), sqrt(1.0 - a))
}
