//! Gyroscope/magnetometer complementary filter
//!
//! The gyroscope z-rate is integrated into a fused heading for near-zero
//! latency on fast rotation. Every magnetometer update nudges the fused
//! heading toward the magnetometer estimate so gyro drift stays bounded:
//!
//! ```text
//! fused = fused + (1 - trust) * shortest_delta(mag, fused)
//! ```
//!
//! Integration is skipped (not zero-filled) when the gap since the previous
//! gyroscope sample reaches the stale threshold.

use super::types::{RawSample, SampleRejection};
use crate::navigation::{circular_delta, wrap_360};

/// Complementary filter configuration
#[derive(Debug, Clone, Copy)]
pub struct FusionConfig {
    /// Weight kept on the gyro estimate at each magnetometer correction, `[0, 1]`
    pub gyro_trust_alpha: f32,
    /// Gyroscope gap (ms) at or above which integration is skipped
    pub stale_threshold_ms: u64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            gyro_trust_alpha: 0.97,
            stale_threshold_ms: 100,
        }
    }
}

/// Gyro-integrated heading corrected toward the magnetometer.
pub struct GyroFusion {
    config: FusionConfig,
    fused_heading: Option<f32>,
    last_gyro_timestamp_ms: Option<u64>,
    stale_count: u32,
}

impl GyroFusion {
    /// Create a new complementary filter.
    ///
    /// Trust alpha is clamped to [0.0, 1.0].
    pub fn new(config: FusionConfig) -> Self {
        Self {
            config: sanitize(config),
            fused_heading: None,
            last_gyro_timestamp_ms: None,
            stale_count: 0,
        }
    }

    /// Fused heading in `[0, 360)`, `None` until the first magnetometer anchor
    pub fn fused_heading(&self) -> Option<f32> {
        self.fused_heading
    }

    /// Timestamp of the last gyroscope sample seen
    pub fn last_gyro_timestamp_ms(&self) -> Option<u64> {
        self.last_gyro_timestamp_ms
    }

    /// Number of gyroscope samples skipped as stale
    pub fn stale_count(&self) -> u32 {
        self.stale_count
    }

    /// Replace tuning values without touching the fused heading
    pub fn set_config(&mut self, config: FusionConfig) {
        self.config = sanitize(config);
    }

    /// Integrate one gyroscope sample.
    ///
    /// The timestamp is always recorded unless the sample is out of order, so
    /// a stale gap only costs the one sample that spans it.
    pub fn ingest_gyroscope(&mut self, sample: &RawSample) -> Result<f32, SampleRejection> {
        if !sample.is_finite() {
            return Err(SampleRejection::InvalidData);
        }

        let Some(last) = self.last_gyro_timestamp_ms else {
            self.last_gyro_timestamp_ms = Some(sample.timestamp_ms);
            return Err(SampleRejection::NotInitialized);
        };
        if sample.timestamp_ms <= last {
            return Err(SampleRejection::OutOfOrder);
        }

        let dt_ms = sample.timestamp_ms - last;
        self.last_gyro_timestamp_ms = Some(sample.timestamp_ms);

        if dt_ms >= self.config.stale_threshold_ms {
            self.stale_count = self.stale_count.saturating_add(1);
            return Err(SampleRejection::StaleSample);
        }

        let Some(fused) = self.fused_heading else {
            return Err(SampleRejection::NotInitialized);
        };

        // Counter-clockwise z rotation lowers the clockwise heading
        let rate_deg_s = sample.z.to_degrees();
        let dt_s = dt_ms as f32 / 1000.0;
        let updated = wrap_360(fused - rate_deg_s * dt_s);
        self.fused_heading = Some(updated);
        Ok(updated)
    }

    /// Nudge the fused heading toward a magnetometer-derived heading.
    ///
    /// The first correction anchors the fused heading outright.
    pub fn correct(&mut self, magnetometer_heading: f32) -> f32 {
        let corrected = match self.fused_heading {
            None => wrap_360(magnetometer_heading),
            Some(fused) => {
                let diff = circular_delta(magnetometer_heading, fused);
                wrap_360(fused + (1.0 - self.config.gyro_trust_alpha) * diff)
            }
        };
        self.fused_heading = Some(corrected);
        corrected
    }
}

fn sanitize(config: FusionConfig) -> FusionConfig {
    FusionConfig {
        gyro_trust_alpha: config.gyro_trust_alpha.clamp(0.0, 1.0),
        stale_threshold_ms: config.stale_threshold_ms.max(1),
    }
}
