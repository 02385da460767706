//! Host subsystems

pub mod compass;
