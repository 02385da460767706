//! Bounded parameter store
//!
//! Compass tunables live here as named values so a host can inspect and
//! change them at runtime. Names are registered once with a typed default;
//! later writes must keep that type. No allocation: names and values sit in
//! fixed-capacity `heapless` maps.

use super::error::ParameterError;
use bitflags::bitflags;
use heapless::index_map::FnvIndexMap;
use heapless::String;

/// Longest accepted name (`CMP_FB_COOLDOWN` is 15)
pub const PARAM_NAME_LEN: usize = 16;

/// Store capacity (must be a power of two)
pub const MAX_PARAMS: usize = 32;

type ParamName = String<PARAM_NAME_LEN>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// `set` is rejected, e.g. CMP_CAL_COUNT while a session runs
        const READ_ONLY = 0b00000001;
    }
}

/// Typed parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl ParamValue {
    /// Type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
        }
    }

    fn same_type(&self, other: &ParamValue) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

/// Per-parameter bookkeeping
#[derive(Debug, Clone, Copy)]
pub struct ParamMetadata {
    pub flags: ParamFlags,
    /// Value given at registration
    pub default_value: ParamValue,
}

/// Name to value map with registration-order iteration.
///
/// Only registered names can be written.
pub struct ParameterStore {
    values: FnvIndexMap<ParamName, ParamValue, MAX_PARAMS>,
    metadata: FnvIndexMap<ParamName, ParamMetadata, MAX_PARAMS>,
}

fn param_name(name: &str) -> Result<ParamName, ParameterError> {
    let mut key = ParamName::new();
    key.push_str(name)
        .map_err(|_| ParameterError::InvalidConfig)?;
    Ok(key)
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: FnvIndexMap::new(),
            metadata: FnvIndexMap::new(),
        }
    }

    /// Current value, `None` if unregistered
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(&param_name(name).ok()?)
    }

    /// Overwrite a registered value.
    ///
    /// # Errors
    ///
    /// `UnknownParameter` for unregistered names, `ReadOnly` for locked ones,
    /// `TypeMismatch` if `value` is not of the registered type.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let key = param_name(name)?;
        let meta = self
            .metadata
            .get(&key)
            .ok_or(ParameterError::UnknownParameter)?;

        if meta.flags.contains(ParamFlags::READ_ONLY) {
            return Err(ParameterError::ReadOnly);
        }
        if !meta.default_value.same_type(&value) {
            return Err(ParameterError::TypeMismatch);
        }

        self.values
            .insert(key, value)
            .map_err(|_| ParameterError::StoreFull)?;
        Ok(())
    }

    /// Register `name` with its default. Re-registering keeps the stored value.
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
        flags: ParamFlags,
    ) -> Result<(), ParameterError> {
        let key = param_name(name)?;
        if self.values.contains_key(&key) {
            return Ok(());
        }

        self.values
            .insert(key.clone(), default_value)
            .map_err(|_| ParameterError::StoreFull)?;
        self.metadata
            .insert(
                key,
                ParamMetadata {
                    flags,
                    default_value,
                },
            )
            .map_err(|_| ParameterError::StoreFull)?;
        Ok(())
    }

    /// Replace the flags of a registered parameter
    pub fn set_flags(&mut self, name: &str, flags: ParamFlags) -> Result<(), ParameterError> {
        let key = param_name(name)?;
        let meta = self
            .metadata
            .get_mut(&key)
            .ok_or(ParameterError::UnknownParameter)?;
        meta.flags = flags;
        Ok(())
    }

    pub fn is_read_only(&self, name: &str) -> bool {
        self.get_metadata(name)
            .is_some_and(|meta| meta.flags.contains(ParamFlags::READ_ONLY))
    }

    pub fn get_metadata(&self, name: &str) -> Option<&ParamMetadata> {
        self.metadata.get(&param_name(name).ok()?)
    }

    /// Restore a registered parameter to its default (ignores READ_ONLY)
    pub fn reset(&mut self, name: &str) -> Result<(), ParameterError> {
        let key = param_name(name)?;
        let default_value = self
            .metadata
            .get(&key)
            .ok_or(ParameterError::UnknownParameter)?
            .default_value;
        self.values
            .insert(key, default_value)
            .map_err(|_| ParameterError::StoreFull)?;
        Ok(())
    }

    /// Names in registration order
    pub fn iter_names(&self) -> impl Iterator<Item = &ParamName> {
        self.values.keys()
    }

    /// `(name, value)` pairs in registration order
    pub fn iter_all(&self) -> impl Iterator<Item = (&ParamName, &ParamValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
