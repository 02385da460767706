//! Collaborators of a compass session
//!
//! The platform sensor layer and the haptic/presentation layer are external;
//! a session talks to them only through these traits.

use qibla_compass_core::feedback::DispatchedEvent;
use qibla_compass_core::navigation::{HeadingSourceType, SensorCapabilities};

use crate::error::CompassError;

/// Platform sensor access.
///
/// Sensor data is pushed back into the session through its `on_*` callbacks
/// on whatever thread the platform delivers them.
pub trait SensorProvider {
    /// Orientation sensors present on this device
    fn capabilities(&self) -> SensorCapabilities;

    /// Start delivery for the selected heading source
    fn subscribe(&mut self, source: HeadingSourceType) -> Result<(), CompassError>;

    /// Stop delivery; must tolerate being called when not subscribed
    fn unsubscribe(&mut self);
}

/// Receiver of debounced feedback events (owns the actual haptic call)
pub trait FeedbackSink {
    fn emit(&mut self, event: &DispatchedEvent);
}

/// Sink that drops every event, for sessions without haptics
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn emit(&mut self, _event: &DispatchedEvent) {}
}

impl<F: FnMut(&DispatchedEvent)> FeedbackSink for F {
    fn emit(&mut self, event: &DispatchedEvent) {
        self(event)
    }
}
