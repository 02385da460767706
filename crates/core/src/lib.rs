//! qibla_compass_core - Pure no_std heading engine for the Qibla compass
//!
//! This crate contains the platform-agnostic algorithms that turn raw
//! orientation sensor samples into a stable heading, compare it against the
//! Qibla bearing, and derive debounced feedback events. Everything here can be
//! tested on host without any platform dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies, no allocation on the hot path
//! - **Trait abstractions**: Platform services injected via traits
//! - **Single writer**: Every state object is owned and mutated by one caller
//!
//! # Modules
//!
//! - [`navigation`]: Great-circle math, geographic types, heading source selection
//! - [`heading`]: Magnetometer filter, gyroscope fusion, sensor calibration
//! - [`alignment`]: Relative rotation and zone tracking against the target bearing
//! - [`feedback`]: Rate-limited feedback event dispatch
//! - [`engine`]: The composed heading pipeline
//! - [`parameters`]: Parameter store and compass parameter definitions
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)

#![no_std]

pub mod alignment;
pub mod engine;
pub mod feedback;
pub mod heading;
pub mod navigation;
pub mod parameters;
pub mod traits;

pub use engine::{CompassConfig, CompassEngine, CompassOutput};
