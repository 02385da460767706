//! Parameter management types and utilities
//!
//! This module provides the bounded parameter store and the compass
//! parameter definitions that map onto `CompassConfig`.

pub mod compass;
pub mod error;
pub mod storage;

pub use compass::{CompassParams, CAL_COUNT_PARAM};
pub use error::ParameterError;
pub use storage::{ParamFlags, ParamMetadata, ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, PARAM_NAME_LEN};
