//! Sensor calibration data and application
//!
//! Provides hard/soft iron calibration for the magnetometer and bias removal
//! for the gyroscope. Values come from the platform or from a calibration
//! procedure run by the host; they are applied before the heading filters.

use nalgebra::Vector3;

use super::types::RawSample;

/// Calibration data for the heading sensors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorCalibration {
    /// Magnetometer hard iron offset (µT)
    /// Subtracted from raw readings (compensates for constant magnetic fields)
    pub mag_offset: Vector3<f32>,

    /// Magnetometer soft iron scale (diagonal only)
    pub mag_scale: Vector3<f32>,

    /// Gyroscope bias (rad/s)
    pub gyro_bias: Vector3<f32>,
}

impl Default for SensorCalibration {
    /// Identity calibration: samples pass through unchanged
    fn default() -> Self {
        Self {
            mag_offset: Vector3::zeros(),
            mag_scale: Vector3::new(1.0, 1.0, 1.0),
            gyro_bias: Vector3::zeros(),
        }
    }
}

impl SensorCalibration {
    /// Apply magnetometer calibration to a raw reading
    ///
    /// # Formula
    ///
    /// ```text
    /// calibrated = (raw - hard_iron_offset) .* soft_iron_scale
    /// ```
    pub fn apply_mag(&self, raw: &RawSample) -> RawSample {
        let v = (raw.vector() - self.mag_offset).component_mul(&self.mag_scale);
        RawSample::new(v.x, v.y, v.z, raw.timestamp_ms)
    }

    /// Remove gyroscope bias from a raw reading
    pub fn apply_gyro(&self, raw: &RawSample) -> RawSample {
        let v = raw.vector() - self.gyro_bias;
        RawSample::new(v.x, v.y, v.z, raw.timestamp_ms)
    }

    /// Check if calibration is non-identity
    ///
    /// This is a heuristic check, not a guarantee of calibration quality.
    pub fn is_calibrated(&self) -> bool {
        let mag_offset_nonzero = self.mag_offset.norm() > 0.01;
        let mag_scale_non_unit = (self.mag_scale - Vector3::new(1.0, 1.0, 1.0)).norm() > 0.001;
        let gyro_bias_nonzero = self.gyro_bias.norm() > 0.001;

        mag_offset_nonzero || mag_scale_non_unit || gyro_bias_nonzero
    }
}

/// Estimate gyro bias from static samples
///
/// The device must be stationary while the samples are collected.
pub fn estimate_gyro_bias(samples: &[RawSample]) -> Vector3<f32> {
    if samples.is_empty() {
        return Vector3::zeros();
    }

    let sum = samples
        .iter()
        .fold(Vector3::zeros(), |acc, sample| acc + sample.vector());
    sum / (samples.len() as f32)
}

/// Estimate the magnetometer hard iron offset from a full rotation
///
/// Takes the midpoint of the per-axis extremes; the device should be turned
/// through every orientation while the samples are collected.
pub fn estimate_hard_iron(samples: &[RawSample]) -> Vector3<f32> {
    let Some(first) = samples.first() else {
        return Vector3::zeros();
    };

    let (min, max) = samples.iter().fold(
        (first.vector(), first.vector()),
        |(min, max), sample| {
            let v = sample.vector();
            (min.inf(&v), max.sup(&v))
        },
    );
    (min + max) / 2.0
}
