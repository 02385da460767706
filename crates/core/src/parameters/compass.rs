//! Compass Parameter Definitions
//!
//! Maps every tunable of `CompassConfig` to a parameter store entry so the
//! host can adjust the engine at runtime.
//!
//! # Parameters
//!
//! - `CMP_JITTER` - Jitter gate threshold (degrees)
//! - `CMP_SMOOTH` - Circular EMA alpha
//! - `CMP_GYRO_TRUST` - Weight kept on the gyro estimate per magnetometer correction
//! - `CMP_ZONE_ALIGN` - Aligned zone half-width (degrees)
//! - `CMP_ZONE_CLOSE` - Close zone half-width (degrees)
//! - `CMP_ZONE_HYST` - Extra margin to leave a zone (degrees)
//! - `CMP_CAL_COUNT` - Accepted samples needed for calibration (read-only while a session runs)
//! - `CMP_FB_COOLDOWN` - Shared feedback cooldown (ms)
//! - `CMP_MAG_MIN` - Magnetometer noise floor (µT)
//! - `CMP_GYRO_STALE` - Gyro gap that skips integration (ms)
//! - `CMP_CARD_WIN` - Cardinal crossing window (degrees)
//! - `CMP_TICK_DEG` - Rotation per haptic tick (degrees)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::alignment::AlignmentConfig;
use crate::engine::CompassConfig;
use crate::feedback::FeedbackConfig;
use crate::heading::{FusionConfig, HeadingFilterConfig};

/// Name of the calibration threshold parameter
pub const CAL_COUNT_PARAM: &str = "CMP_CAL_COUNT";

// --- Defaults ---

const DEFAULT_JITTER: f32 = 0.3;
const DEFAULT_SMOOTH: f32 = 0.55;
const DEFAULT_GYRO_TRUST: f32 = 0.97;
const DEFAULT_ZONE_ALIGN: f32 = 5.0;
const DEFAULT_ZONE_CLOSE: f32 = 15.0;
const DEFAULT_ZONE_HYST: f32 = 0.0;
const DEFAULT_CAL_COUNT: i32 = 30;
const DEFAULT_FB_COOLDOWN: i32 = 90;
const DEFAULT_MAG_MIN: f32 = 10.0;
const DEFAULT_GYRO_STALE: i32 = 100;
const DEFAULT_CARD_WIN: f32 = 2.0;
const DEFAULT_TICK_DEG: f32 = 15.0;

// --- Ranges ---

const MIN_JITTER: f32 = 0.0;
const MAX_JITTER: f32 = 5.0;

const MIN_SMOOTH: f32 = 0.01;
const MAX_SMOOTH: f32 = 1.0;

const MIN_GYRO_TRUST: f32 = 0.0;
const MAX_GYRO_TRUST: f32 = 1.0;

const MIN_ZONE_ALIGN: f32 = 0.5;
const MAX_ZONE_ALIGN: f32 = 45.0;

const MIN_ZONE_CLOSE: f32 = 1.0;
const MAX_ZONE_CLOSE: f32 = 90.0;

const MIN_ZONE_HYST: f32 = 0.0;
const MAX_ZONE_HYST: f32 = 5.0;

const MIN_CAL_COUNT: i32 = 1;
const MAX_CAL_COUNT: i32 = 1000;

const MIN_FB_COOLDOWN: i32 = 0;
const MAX_FB_COOLDOWN: i32 = 1000;

const MIN_MAG_MIN: f32 = 0.0;
const MAX_MAG_MIN: f32 = 100.0;

const MIN_GYRO_STALE: i32 = 1;
const MAX_GYRO_STALE: i32 = 1000;

const MIN_CARD_WIN: f32 = 0.1;
const MAX_CARD_WIN: f32 = 10.0;

const MIN_TICK_DEG: f32 = 1.0;
const MAX_TICK_DEG: f32 = 90.0;

/// Compass parameters loaded from parameter store
#[derive(Debug, Clone, PartialEq)]
pub struct CompassParams {
    /// Jitter gate threshold (degrees)
    pub jitter_threshold_deg: f32,
    /// Circular EMA alpha (higher = more responsive)
    pub smoothing_alpha: f32,
    /// Complementary filter gyro weight
    pub gyro_trust_alpha: f32,
    /// Aligned zone half-width (degrees)
    pub aligned_zone_deg: f32,
    /// Close zone half-width (degrees)
    pub close_zone_deg: f32,
    /// Zone exit margin (degrees)
    pub zone_hysteresis_deg: f32,
    /// Accepted samples before the heading counts as calibrated
    pub calibration_sample_threshold: u32,
    /// Shared feedback cooldown (ms)
    pub feedback_cooldown_ms: u64,
    /// Magnetometer noise floor (µT)
    pub min_field_strength_ut: f32,
    /// Gyro gap that skips integration (ms)
    pub gyro_stale_ms: u64,
    /// Cardinal crossing window (degrees)
    pub cardinal_window_deg: f32,
    /// Rotation per haptic tick (degrees)
    pub rotation_tick_deg: f32,
}

impl Default for CompassParams {
    fn default() -> Self {
        Self {
            jitter_threshold_deg: DEFAULT_JITTER,
            smoothing_alpha: DEFAULT_SMOOTH,
            gyro_trust_alpha: DEFAULT_GYRO_TRUST,
            aligned_zone_deg: DEFAULT_ZONE_ALIGN,
            close_zone_deg: DEFAULT_ZONE_CLOSE,
            zone_hysteresis_deg: DEFAULT_ZONE_HYST,
            calibration_sample_threshold: DEFAULT_CAL_COUNT as u32,
            feedback_cooldown_ms: DEFAULT_FB_COOLDOWN as u64,
            min_field_strength_ut: DEFAULT_MAG_MIN,
            gyro_stale_ms: DEFAULT_GYRO_STALE as u64,
            cardinal_window_deg: DEFAULT_CARD_WIN,
            rotation_tick_deg: DEFAULT_TICK_DEG,
        }
    }
}

impl CompassParams {
    /// Register compass parameters with default values
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        let floats = [
            ("CMP_JITTER", DEFAULT_JITTER),
            ("CMP_SMOOTH", DEFAULT_SMOOTH),
            ("CMP_GYRO_TRUST", DEFAULT_GYRO_TRUST),
            ("CMP_ZONE_ALIGN", DEFAULT_ZONE_ALIGN),
            ("CMP_ZONE_CLOSE", DEFAULT_ZONE_CLOSE),
            ("CMP_ZONE_HYST", DEFAULT_ZONE_HYST),
            ("CMP_MAG_MIN", DEFAULT_MAG_MIN),
            ("CMP_CARD_WIN", DEFAULT_CARD_WIN),
            ("CMP_TICK_DEG", DEFAULT_TICK_DEG),
        ];
        for (name, value) in floats {
            store.register(name, ParamValue::Float(value), ParamFlags::empty())?;
        }

        let ints = [
            (CAL_COUNT_PARAM, DEFAULT_CAL_COUNT),
            ("CMP_FB_COOLDOWN", DEFAULT_FB_COOLDOWN),
            ("CMP_GYRO_STALE", DEFAULT_GYRO_STALE),
        ];
        for (name, value) in ints {
            store.register(name, ParamValue::Int(value), ParamFlags::empty())?;
        }

        Ok(())
    }

    /// Load compass parameters from parameter store
    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            jitter_threshold_deg: load_float(
                store,
                "CMP_JITTER",
                DEFAULT_JITTER,
                MIN_JITTER,
                MAX_JITTER,
            ),
            smoothing_alpha: load_float(store, "CMP_SMOOTH", DEFAULT_SMOOTH, MIN_SMOOTH, MAX_SMOOTH),
            gyro_trust_alpha: load_float(
                store,
                "CMP_GYRO_TRUST",
                DEFAULT_GYRO_TRUST,
                MIN_GYRO_TRUST,
                MAX_GYRO_TRUST,
            ),
            aligned_zone_deg: load_float(
                store,
                "CMP_ZONE_ALIGN",
                DEFAULT_ZONE_ALIGN,
                MIN_ZONE_ALIGN,
                MAX_ZONE_ALIGN,
            ),
            close_zone_deg: load_float(
                store,
                "CMP_ZONE_CLOSE",
                DEFAULT_ZONE_CLOSE,
                MIN_ZONE_CLOSE,
                MAX_ZONE_CLOSE,
            ),
            zone_hysteresis_deg: load_float(
                store,
                "CMP_ZONE_HYST",
                DEFAULT_ZONE_HYST,
                MIN_ZONE_HYST,
                MAX_ZONE_HYST,
            ),
            calibration_sample_threshold: load_int(
                store,
                CAL_COUNT_PARAM,
                DEFAULT_CAL_COUNT,
                MIN_CAL_COUNT,
                MAX_CAL_COUNT,
            ) as u32,
            feedback_cooldown_ms: load_int(
                store,
                "CMP_FB_COOLDOWN",
                DEFAULT_FB_COOLDOWN,
                MIN_FB_COOLDOWN,
                MAX_FB_COOLDOWN,
            ) as u64,
            min_field_strength_ut: load_float(
                store,
                "CMP_MAG_MIN",
                DEFAULT_MAG_MIN,
                MIN_MAG_MIN,
                MAX_MAG_MIN,
            ),
            gyro_stale_ms: load_int(
                store,
                "CMP_GYRO_STALE",
                DEFAULT_GYRO_STALE,
                MIN_GYRO_STALE,
                MAX_GYRO_STALE,
            ) as u64,
            cardinal_window_deg: load_float(
                store,
                "CMP_CARD_WIN",
                DEFAULT_CARD_WIN,
                MIN_CARD_WIN,
                MAX_CARD_WIN,
            ),
            rotation_tick_deg: load_float(
                store,
                "CMP_TICK_DEG",
                DEFAULT_TICK_DEG,
                MIN_TICK_DEG,
                MAX_TICK_DEG,
            ),
        }
    }

    /// Convert to `CompassConfig` for use by `CompassEngine`
    pub fn to_config(&self) -> CompassConfig {
        CompassConfig {
            filter: HeadingFilterConfig {
                jitter_threshold_deg: self.jitter_threshold_deg,
                smoothing_alpha: self.smoothing_alpha,
                calibration_sample_threshold: self.calibration_sample_threshold,
                min_field_strength_ut: self.min_field_strength_ut,
            },
            fusion: FusionConfig {
                gyro_trust_alpha: self.gyro_trust_alpha,
                stale_threshold_ms: self.gyro_stale_ms,
            },
            alignment: AlignmentConfig {
                aligned_zone_deg: self.aligned_zone_deg,
                close_zone_deg: self.close_zone_deg,
                zone_hysteresis_deg: self.zone_hysteresis_deg,
            },
            feedback: FeedbackConfig {
                cooldown_ms: self.feedback_cooldown_ms,
                cardinal_window_deg: self.cardinal_window_deg,
                rotation_tick_deg: self.rotation_tick_deg,
            },
        }
    }

    /// Validate compass parameters
    pub fn is_valid(&self) -> bool {
        let floats = [
            (self.jitter_threshold_deg, MIN_JITTER, MAX_JITTER),
            (self.smoothing_alpha, MIN_SMOOTH, MAX_SMOOTH),
            (self.gyro_trust_alpha, MIN_GYRO_TRUST, MAX_GYRO_TRUST),
            (self.aligned_zone_deg, MIN_ZONE_ALIGN, MAX_ZONE_ALIGN),
            (self.close_zone_deg, MIN_ZONE_CLOSE, MAX_ZONE_CLOSE),
            (self.zone_hysteresis_deg, MIN_ZONE_HYST, MAX_ZONE_HYST),
            (self.min_field_strength_ut, MIN_MAG_MIN, MAX_MAG_MIN),
            (self.cardinal_window_deg, MIN_CARD_WIN, MAX_CARD_WIN),
            (self.rotation_tick_deg, MIN_TICK_DEG, MAX_TICK_DEG),
        ];
        // NaN fails both comparisons
        if floats.iter().any(|&(v, min, max)| !(v >= min && v <= max)) {
            return false;
        }
        if !in_range(self.calibration_sample_threshold as i64, MIN_CAL_COUNT, MAX_CAL_COUNT)
            || !in_range(self.feedback_cooldown_ms as i64, MIN_FB_COOLDOWN, MAX_FB_COOLDOWN)
            || !in_range(self.gyro_stale_ms as i64, MIN_GYRO_STALE, MAX_GYRO_STALE)
        {
            return false;
        }

        // Consistency: the aligned zone must sit inside the close zone
        self.aligned_zone_deg < self.close_zone_deg
    }
}

fn in_range(value: i64, min: i32, max: i32) -> bool {
    value >= min as i64 && value <= max as i64
}

/// Load a float parameter from store with clamping
fn load_float(store: &ParameterStore, name: &str, default: f32, min: f32, max: f32) -> f32 {
    match store.get(name) {
        Some(ParamValue::Float(v)) if v.is_finite() => v.clamp(min, max),
        Some(ParamValue::Int(v)) => (*v as f32).clamp(min, max),
        _ => default,
    }
}

/// Load an integer parameter from store with clamping
fn load_int(store: &ParameterStore, name: &str, default: i32, min: i32, max: i32) -> i32 {
    match store.get(name) {
        Some(ParamValue::Int(v)) => (*v).clamp(min, max),
        Some(ParamValue::Float(v)) if v.is_finite() => (*v as i32).clamp(min, max),
        _ => default,
    }
}
