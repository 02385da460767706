//! Logging abstraction
//!
//! Unified `log_*!` macros for the host crate. They forward to the `log`
//! facade, so the embedding application chooses the backend (the
//! `compass_replay` binary installs `env_logger`). Without a logger installed
//! the macros are no-ops.
//!
//! The engine crate never logs; only session lifecycle and dropped-sample
//! diagnostics go through here.

#[doc(hidden)]
pub use ::log as __log;

/// Log at info level
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        $crate::core::logging::__log::info!($($arg)*);
    }};
}

/// Log at warn level
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        $crate::core::logging::__log::warn!($($arg)*);
    }};
}

/// Log at error level
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        $crate::core::logging::__log::error!($($arg)*);
    }};
}

/// Log at debug level
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        $crate::core::logging::__log::debug!($($arg)*);
    }};
}

/// Log at trace level
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        $crate::core::logging::__log::trace!($($arg)*);
    }};
}

/// Install `env_logger` for tests; repeated calls are ignored
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
