//! Shared compass output for the rendering layer
//!
//! The session is the only writer. Renderers read the latest snapshot every
//! frame from any thread; a stale-by-one-sample read is fine, a torn read is
//! not.

use core::cell::UnsafeCell;

use qibla_compass_core::alignment::Zone;
use qibla_compass_core::heading::CalibrationState;
use qibla_compass_core::CompassOutput;

/// Thread-safe wrapper for the published `CompassOutput`
///
/// Uses critical sections for atomic read/write of the whole snapshot.
pub struct SharedCompassState {
    output: UnsafeCell<CompassOutput>,
}

// Safety: CompassOutput is plain Copy data; every access goes through a
// critical section.
unsafe impl Sync for SharedCompassState {}
unsafe impl Send for SharedCompassState {}

impl SharedCompassState {
    /// Create shared state holding the empty output
    pub const fn new() -> Self {
        Self {
            output: UnsafeCell::new(CompassOutput {
                cumulative_rotation: 0.0,
                heading: None,
                calibration: CalibrationState::Uncalibrated,
                zone: Zone::Off,
                timestamp_ms: 0,
            }),
        }
    }

    /// Read the latest snapshot (thread-safe)
    pub fn read(&self) -> CompassOutput {
        critical_section::with(|_cs| unsafe { *self.output.get() })
    }

    /// Publish a new snapshot (thread-safe)
    pub fn write(&self, output: CompassOutput) {
        critical_section::with(|_cs| unsafe {
            *self.output.get() = output;
        });
    }

    /// Needle rotation of the latest snapshot (degrees)
    pub fn cumulative_rotation(&self) -> f32 {
        self.read().cumulative_rotation
    }

    /// True if the latest snapshot is younger than `max_age_ms`
    pub fn is_fresh(&self, now_ms: u64, max_age_ms: u64) -> bool {
        let output = self.read();
        output.heading.is_some() && now_ms.saturating_sub(output.timestamp_ms) < max_age_ms
    }
}

impl Default for SharedCompassState {
    fn default() -> Self {
        Self::new()
    }
}
