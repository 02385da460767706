//! Platform service abstractions
//!
//! The engine itself never reads a clock; hosts that receive headings without
//! timestamps (platform heading API) stamp them through [`TimeSource`].

pub mod time;

pub use time::{MockTime, TimeSource};
