//! Alignment tracking against the target bearing

pub mod tracker;

pub use tracker::{
    AlignmentConfig, AlignmentState, AlignmentTracker, AlignmentUpdate, Zone, ZoneTransition,
};
