//! qibla_compass - Host integration of the Qibla compass heading engine
//!
//! The algorithms live in the `no_std` [`qibla_compass_core`] crate. This
//! crate wires them to a platform: session lifecycle, published output for
//! renderers, logging, and simulation/replay tooling.

// Logging macros and host infrastructure
pub mod core;

pub mod error;

// Deterministic sensor simulation and trace format
pub mod simulation;

// Compass session
pub mod subsystems;

pub use error::CompassError;
pub use subsystems::compass::{
    CompassSession, FeedbackSink, NullSink, SensorProvider, SharedCompassState,
};
