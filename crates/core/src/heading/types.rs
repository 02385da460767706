//! Heading pipeline types
//!
//! Raw sensor samples, calibration state and per-sample rejection reasons.
//!
//! # Coordinate System
//!
//! - Device frame: +x toward the right edge of the screen, +y toward the top
//!   edge, +z out of the screen
//! - Heading: clockwise angle from magnetic north to the device +y axis,
//!   `atan2(-x, y)` in degrees, normalized to `[0, 360)`
//! - Gyroscope: right-handed rates in rad/s, positive z = counter-clockwise
//!   when viewed from above

use libm::{atan2f, cosf, sinf};
use nalgebra::Vector3;

use crate::navigation::wrap_360;

/// One magnetometer (µT) or gyroscope (rad/s) reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Platform timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl RawSample {
    /// Create a new sample
    pub fn new(x: f32, y: f32, z: f32, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    /// Horizontal magnetic field that a device at `heading_deg` would measure
    ///
    /// Inverse of [`magnetometer_heading`]; used by simulation and tests.
    pub fn from_heading(heading_deg: f32, field_strength: f32, timestamp_ms: u64) -> Self {
        let h = heading_deg.to_radians();
        Self::new(
            -field_strength * sinf(h),
            field_strength * cosf(h),
            0.0,
            timestamp_ms,
        )
    }

    /// Sample as a vector
    pub fn vector(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Euclidean magnitude of the sample
    pub fn magnitude(&self) -> f32 {
        self.vector().norm()
    }

    /// True if every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Heading of the device +y axis from a magnetometer reading, `[0, 360)`.
pub fn magnetometer_heading(x: f32, y: f32) -> f32 {
    wrap_360(atan2f(-x, y).to_degrees())
}

/// Calibration quality of the heading filter
///
/// `Uncalibrated → Calibrating → Calibrated`. `Unavailable` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    /// No sample accepted yet
    Uncalibrated,
    /// Accepting samples, threshold not reached
    Calibrating,
    /// Enough clean samples accepted
    Calibrated,
    /// No motion sensor on this device
    Unavailable,
}

impl CalibrationState {
    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationState::Uncalibrated => "Uncalibrated",
            CalibrationState::Calibrating => "Calibrating",
            CalibrationState::Calibrated => "Calibrated",
            CalibrationState::Unavailable => "Unavailable",
        }
    }

    /// Compact encoding for published state
    pub fn to_u8(self) -> u8 {
        match self {
            CalibrationState::Uncalibrated => 0,
            CalibrationState::Calibrating => 1,
            CalibrationState::Calibrated => 2,
            CalibrationState::Unavailable => 3,
        }
    }

    /// Decode from [`CalibrationState::to_u8`]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CalibrationState::Uncalibrated),
            1 => Some(CalibrationState::Calibrating),
            2 => Some(CalibrationState::Calibrated),
            3 => Some(CalibrationState::Unavailable),
            _ => None,
        }
    }
}

/// Why a sample did not change the heading estimate
///
/// All of these are recovered locally by dropping the sample; none is ever
/// shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRejection {
    /// Magnetic field below the noise floor
    WeakSignal,
    /// Change smaller than the jitter threshold
    Jitter,
    /// Gyroscope gap too large to integrate
    StaleSample,
    /// Timestamp not after the previous sample
    OutOfOrder,
    /// NaN or infinite component
    InvalidData,
    /// No reference yet (first gyroscope sample, or no magnetometer anchor)
    NotInitialized,
    /// The sensor is not part of the selected heading source
    Unavailable,
}

impl SampleRejection {
    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleRejection::WeakSignal => "WeakSignal",
            SampleRejection::Jitter => "Jitter",
            SampleRejection::StaleSample => "StaleSample",
            SampleRejection::OutOfOrder => "OutOfOrder",
            SampleRejection::InvalidData => "InvalidData",
            SampleRejection::NotInitialized => "NotInitialized",
            SampleRejection::Unavailable => "Unavailable",
        }
    }
}

impl core::fmt::Display for SampleRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SampleRejection::WeakSignal => write!(f, "magnetic field below noise floor"),
            SampleRejection::Jitter => write!(f, "change within jitter threshold"),
            SampleRejection::StaleSample => write!(f, "sample gap too large to integrate"),
            SampleRejection::OutOfOrder => write!(f, "sample timestamp out of order"),
            SampleRejection::InvalidData => write!(f, "sample contains non-finite values"),
            SampleRejection::NotInitialized => write!(f, "no reference sample yet"),
            SampleRejection::Unavailable => write!(f, "sensor not available"),
        }
    }
}
