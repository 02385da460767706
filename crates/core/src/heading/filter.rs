//! Magnetometer heading filter
//!
//! Turns raw magnetometer samples into a smoothed compass heading with a
//! calibration-quality flag. Samples pass, in order, through a field-strength
//! noise floor, a jitter gate and circular exponential smoothing.
//!
//! Smoothing is angle-aware (e.g., 350° → 10° moves +20°, never -340°).

use super::types::{magnetometer_heading, CalibrationState, RawSample, SampleRejection};
use crate::navigation::{circular_delta, wrap_360};

/// Heading filter configuration
///
/// # Smoothing
/// - `smoothing_alpha = 1.0`: no filtering (pass-through)
/// - `smoothing_alpha = 0.55`: responsive with light smoothing (default)
/// - lower values smooth more at the cost of lag
#[derive(Debug, Clone, Copy)]
pub struct HeadingFilterConfig {
    /// Minimum change from the last accepted raw angle (degrees)
    pub jitter_threshold_deg: f32,
    /// EMA weight of the new sample, `(0, 1]`
    pub smoothing_alpha: f32,
    /// Accepted samples required before the heading counts as calibrated.
    ///
    /// Inclusive: the sample that brings the count to this value calibrates.
    pub calibration_sample_threshold: u32,
    /// Field magnitude below which a sample is dropped (µT)
    pub min_field_strength_ut: f32,
}

impl Default for HeadingFilterConfig {
    fn default() -> Self {
        Self {
            jitter_threshold_deg: 0.3,
            smoothing_alpha: 0.55,
            calibration_sample_threshold: 30,
            min_field_strength_ut: 10.0,
        }
    }
}

/// Snapshot of the filter state
///
/// Only [`HeadingFilter`] mutates this. `smoothed_heading` is always in
/// `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingState {
    smoothed_heading: f32,
    last_raw_angle: Option<f32>,
    calibration_sample_count: u32,
    is_calibrated: bool,
    calibration: CalibrationState,
}

impl HeadingState {
    const fn initial() -> Self {
        Self {
            smoothed_heading: 0.0,
            last_raw_angle: None,
            calibration_sample_count: 0,
            is_calibrated: false,
            calibration: CalibrationState::Uncalibrated,
        }
    }

    /// Smoothed heading, or `None` before the first accepted sample
    pub fn heading(&self) -> Option<f32> {
        self.last_raw_angle.map(|_| self.smoothed_heading)
    }

    /// Smoothed heading in `[0, 360)` (0 before the first accepted sample)
    pub fn smoothed_heading(&self) -> f32 {
        self.smoothed_heading
    }

    /// Last accepted raw angle
    pub fn last_raw_angle(&self) -> Option<f32> {
        self.last_raw_angle
    }

    /// Samples accepted in the current calibration cycle
    pub fn calibration_sample_count(&self) -> u32 {
        self.calibration_sample_count
    }

    /// True once the calibration threshold was reached in this cycle
    pub fn is_calibrated(&self) -> bool {
        self.is_calibrated
    }

    /// Calibration state machine position
    pub fn calibration(&self) -> CalibrationState {
        self.calibration
    }
}

/// Counters for dropped and accepted samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub accepted: u32,
    pub weak_signal: u32,
    pub jitter: u32,
    pub invalid: u32,
}

/// Circular EMA heading filter with jitter gate and calibration tracking.
pub struct HeadingFilter {
    config: HeadingFilterConfig,
    state: HeadingState,
    stats: FilterStats,
}

impl HeadingFilter {
    /// Create a new filter.
    ///
    /// Alpha is clamped to (0.0, 1.0]; thresholds to non-negative values.
    pub fn new(config: HeadingFilterConfig) -> Self {
        Self {
            config: sanitize(config),
            state: HeadingState::initial(),
            stats: FilterStats::default(),
        }
    }

    /// Create a filter for a device without motion sensors.
    ///
    /// Every ingest is rejected with [`SampleRejection::Unavailable`].
    pub fn unavailable(config: HeadingFilterConfig) -> Self {
        let mut filter = Self::new(config);
        filter.state.calibration = CalibrationState::Unavailable;
        filter
    }

    /// Current state snapshot
    pub fn state(&self) -> &HeadingState {
        &self.state
    }

    /// Sample counters
    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Active configuration
    pub fn config(&self) -> &HeadingFilterConfig {
        &self.config
    }

    /// Replace tuning values without touching the heading or calibration cycle.
    ///
    /// A lower calibration threshold takes effect on the next accepted sample.
    pub fn set_config(&mut self, config: HeadingFilterConfig) {
        self.config = sanitize(config);
    }

    /// Feed one magnetometer sample.
    ///
    /// On `Err` the sample was dropped and the heading is unchanged.
    pub fn ingest_magnetometer(
        &mut self,
        sample: &RawSample,
    ) -> Result<HeadingState, SampleRejection> {
        self.check_available()?;
        if !sample.is_finite() {
            self.stats.invalid = self.stats.invalid.saturating_add(1);
            return Err(SampleRejection::InvalidData);
        }
        if sample.magnitude() < self.config.min_field_strength_ut {
            self.stats.weak_signal = self.stats.weak_signal.saturating_add(1);
            return Err(SampleRejection::WeakSignal);
        }

        self.ingest_angle(magnetometer_heading(sample.x, sample.y))
    }

    /// Feed a heading that is already in degrees (platform heading API).
    ///
    /// Skips the field-strength gate; jitter gate, smoothing and calibration
    /// tracking apply as for magnetometer samples.
    pub fn ingest_heading(&mut self, heading_deg: f32) -> Result<HeadingState, SampleRejection> {
        self.check_available()?;
        if !heading_deg.is_finite() {
            self.stats.invalid = self.stats.invalid.saturating_add(1);
            return Err(SampleRejection::InvalidData);
        }

        self.ingest_angle(wrap_360(heading_deg))
    }

    /// Start a new calibration cycle.
    ///
    /// Keeps the current heading; only the calibration counter and flag reset.
    /// Has no effect on an unavailable filter.
    pub fn recalibrate(&mut self) {
        if self.state.calibration == CalibrationState::Unavailable {
            return;
        }
        self.state.calibration_sample_count = 0;
        self.state.is_calibrated = false;
        self.state.calibration = CalibrationState::Calibrating;
    }

    fn check_available(&self) -> Result<(), SampleRejection> {
        if self.state.calibration == CalibrationState::Unavailable {
            Err(SampleRejection::Unavailable)
        } else {
            Ok(())
        }
    }

    fn ingest_angle(&mut self, raw: f32) -> Result<HeadingState, SampleRejection> {
        let state = &mut self.state;

        match state.last_raw_angle {
            None => {
                state.smoothed_heading = raw;
            }
            Some(last) => {
                if libm::fabsf(circular_delta(raw, last)) < self.config.jitter_threshold_deg {
                    self.stats.jitter = self.stats.jitter.saturating_add(1);
                    return Err(SampleRejection::Jitter);
                }
                let diff = circular_delta(raw, state.smoothed_heading).clamp(-180.0, 180.0);
                state.smoothed_heading =
                    wrap_360(state.smoothed_heading + self.config.smoothing_alpha * diff);
            }
        }
        state.last_raw_angle = Some(raw);

        state.calibration_sample_count = state.calibration_sample_count.saturating_add(1);
        if state.calibration == CalibrationState::Uncalibrated {
            state.calibration = CalibrationState::Calibrating;
        }
        if !state.is_calibrated
            && state.calibration_sample_count >= self.config.calibration_sample_threshold
        {
            state.is_calibrated = true;
            state.calibration = CalibrationState::Calibrated;
        }

        self.stats.accepted = self.stats.accepted.saturating_add(1);
        Ok(*state)
    }
}

fn sanitize(config: HeadingFilterConfig) -> HeadingFilterConfig {
    HeadingFilterConfig {
        jitter_threshold_deg: config.jitter_threshold_deg.max(0.0),
        smoothing_alpha: config.smoothing_alpha.clamp(f32::EPSILON, 1.0),
        calibration_sample_threshold: config.calibration_sample_threshold.max(1),
        min_field_strength_ut: config.min_field_strength_ut.max(0.0),
    }
}
