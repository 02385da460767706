//! Heading estimation from orientation sensors
//!
//! - [`filter`]: magnetometer noise floor, jitter gate, circular smoothing and
//!   calibration tracking
//! - [`fusion`]: gyroscope integration corrected toward the magnetometer
//! - [`calibration`]: hard/soft iron and gyro bias correction

pub mod calibration;
pub mod filter;
pub mod fusion;
pub mod types;

pub use calibration::{estimate_gyro_bias, estimate_hard_iron, SensorCalibration};
pub use filter::{FilterStats, HeadingFilter, HeadingFilterConfig, HeadingState};
pub use fusion::{FusionConfig, GyroFusion};
pub use types::{magnetometer_heading, CalibrationState, RawSample, SampleRejection};
