//! Host-side error type

use qibla_compass_core::parameters::ParameterError;

/// Errors surfaced by the compass session and tools.
///
/// Only [`CompassError::SensorUnavailable`] is meant to reach the user, as a
/// fallback message; per-sample conditions never leave the engine.
#[derive(Debug, thiserror::Error)]
pub enum CompassError {
    #[error("No orientation sensor available")]
    SensorUnavailable,

    #[error("Sensor subscription failed: {0}")]
    Subscription(String),

    #[error("Invalid compass parameters")]
    InvalidParameters,

    #[error("Parameter error: {0}")]
    Parameter(ParameterError),

    #[error("Trace line {line}: {source}")]
    Trace {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ParameterError lives in a no_std crate without std::error::Error
impl From<ParameterError> for CompassError {
    fn from(err: ParameterError) -> Self {
        CompassError::Parameter(err)
    }
}
