//! Parameter error types

/// Errors from parameter store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// Name longer than `PARAM_NAME_LEN`
    InvalidConfig,
    /// Value type differs from the registered default
    TypeMismatch,
    /// Store is full
    StoreFull,
    /// Read-only parameter cannot be modified
    ReadOnly,
    /// No parameter registered under this name
    UnknownParameter,
}

impl ParameterError {
    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterError::InvalidConfig => "InvalidConfig",
            ParameterError::TypeMismatch => "TypeMismatch",
            ParameterError::StoreFull => "StoreFull",
            ParameterError::ReadOnly => "ReadOnly",
            ParameterError::UnknownParameter => "UnknownParameter",
        }
    }
}

impl core::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParameterError::InvalidConfig => write!(f, "invalid parameter name"),
            ParameterError::TypeMismatch => write!(f, "parameter value has the wrong type"),
            ParameterError::StoreFull => write!(f, "parameter store full"),
            ParameterError::ReadOnly => write!(f, "parameter is read-only"),
            ParameterError::UnknownParameter => write!(f, "unknown parameter"),
        }
    }
}
