//! Host-side infrastructure shared by the subsystems

pub mod logging;
pub mod time;

pub use time::StdTime;
