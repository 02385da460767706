//! Compass subsystem
//!
//! Hosts the heading engine for one compass view:
//!
//! - [`session`]: lifecycle, sensor callbacks, parameter application
//! - [`provider`]: platform sensor and feedback collaborators
//! - [`state`]: published output shared with renderers

pub mod provider;
pub mod session;
pub mod state;

pub use provider::{FeedbackSink, NullSink, SensorProvider};
pub use session::CompassSession;
pub use state::SharedCompassState;
