//! Wall-clock time source for hosts

use std::time::Instant;

use qibla_compass_core::traits::TimeSource;

/// Monotonic clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct StdTime {
    origin: Instant,
}

impl StdTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StdTime {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
