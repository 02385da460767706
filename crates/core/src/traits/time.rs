//! Time abstraction for stamping sensor callbacks.

use core::sync::atomic::{AtomicU64, Ordering};

/// Monotonic clock used to stamp samples that arrive without a timestamp.
///
/// # Example
///
/// ```
/// use qibla_compass_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// let stamp = time.now_ms();
/// time.advance_ms(16);
/// assert_eq!(time.elapsed_ms_since(stamp), 16);
/// ```
pub trait TimeSource: Clone + Send + Sync {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `reference_ms`, saturating at zero
    fn elapsed_ms_since(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share nothing; each holds its own counter.
#[derive(Default)]
pub struct MockTime {
    current_ms: AtomicU64,
}

impl Clone for MockTime {
    fn clone(&self) -> Self {
        Self::with_initial(self.now_ms())
    }
}

impl MockTime {
    /// Clock starting at 0 ms
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `ms`
    pub fn with_initial(ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(ms),
        }
    }

    /// Jump to an absolute time
    pub fn set_ms(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::Relaxed);
    }

    /// Move forward by `ms`
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_time_initial_value() {
        assert_eq!(MockTime::new().now_ms(), 0);
        assert_eq!(MockTime::with_initial(5_000).now_ms(), 5_000);
    }

    #[test]
    fn mock_time_set_and_advance() {
        let time = MockTime::new();
        time.set_ms(1_000);
        time.advance_ms(16);
        assert_eq!(time.now_ms(), 1_016);
    }

    #[test]
    fn mock_time_elapsed_saturates() {
        let time = MockTime::with_initial(1_000);
        assert_eq!(time.elapsed_ms_since(400), 600);
        // Reference in the future
        assert_eq!(time.elapsed_ms_since(5_000), 0);
    }

    #[test]
    fn mock_time_clone_is_independent() {
        let time = MockTime::with_initial(10);
        let copy = time.clone();
        time.advance_ms(5);
        assert_eq!(copy.now_ms(), 10);
    }
}
