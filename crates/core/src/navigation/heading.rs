//! Heading source abstraction
//!
//! Provides a unified interface for obtaining heading information from the
//! sensor strategies a device can support (magnetometer, magnetometer plus
//! gyroscope, or a platform-provided heading API). The strategy is selected
//! once at startup from the device's capabilities.

use bitflags::bitflags;

bitflags! {
    /// Orientation sensors reported by the host platform
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SensorCapabilities: u8 {
        /// Raw 3-axis magnetometer
        const MAGNETOMETER = 0b0000_0001;
        /// Raw 3-axis gyroscope
        const GYROSCOPE = 0b0000_0010;
        /// Platform heading API (already fused by the OS)
        const PLATFORM_HEADING = 0b0000_0100;
    }
}

/// Type of heading source currently being used
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingSourceType {
    /// Smoothed magnetometer heading
    MagnetometerOnly,
    /// Gyroscope-integrated heading corrected by the magnetometer
    MagnetometerPlusGyro,
    /// Heading delivered by the platform, smoothed locally
    PlatformHeading,
    /// No usable sensor; the feature must fall back to a static mode
    Unavailable,
}

impl HeadingSourceType {
    /// Select the heading strategy for the given capabilities.
    ///
    /// Raw magnetometer data wins over the platform API. A gyroscope without
    /// a magnetometer is not a heading source.
    pub fn select(capabilities: SensorCapabilities) -> Self {
        if capabilities.contains(SensorCapabilities::MAGNETOMETER) {
            if capabilities.contains(SensorCapabilities::GYROSCOPE) {
                HeadingSourceType::MagnetometerPlusGyro
            } else {
                HeadingSourceType::MagnetometerOnly
            }
        } else if capabilities.contains(SensorCapabilities::PLATFORM_HEADING) {
            HeadingSourceType::PlatformHeading
        } else {
            HeadingSourceType::Unavailable
        }
    }

    /// True if this source needs gyroscope samples
    pub fn uses_gyroscope(&self) -> bool {
        matches!(self, HeadingSourceType::MagnetometerPlusGyro)
    }

    /// Return variant name as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingSourceType::MagnetometerOnly => "MagnetometerOnly",
            HeadingSourceType::MagnetometerPlusGyro => "MagnetometerPlusGyro",
            HeadingSourceType::PlatformHeading => "PlatformHeading",
            HeadingSourceType::Unavailable => "Unavailable",
        }
    }
}

/// Provides heading information
///
/// This trait abstracts the source of heading data, allowing different
/// implementations for various sensor configurations.
pub trait HeadingSource {
    /// Returns current heading in degrees (0-360, 0 = magnetic north)
    ///
    /// Returns `None` if no valid heading is available.
    fn get_heading(&self) -> Option<f32>;

    /// Returns true if heading source is healthy and providing valid data
    fn is_valid(&self) -> bool;

    /// Returns the current heading source type for diagnostics
    fn source_type(&self) -> HeadingSourceType;
}
