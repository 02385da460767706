//! Feedback events for the haptic/presentation layer

pub mod dispatcher;

pub use dispatcher::{
    Cardinal, CardinalDetector, DispatchedEvent, EventBuffer, FeedbackConfig, FeedbackDispatcher,
    FeedbackEvent, FeedbackInput, RotationTicker, EVENT_BUFFER_CAPACITY,
};
