//! Logging macros used across the workspace.
//!
//! They forward to `tracing`, so the caller's module path stays the event
//! target and any subscriber installed by the binary picks them up.

/// `tracing::trace!` for crate internals
#[macro_export]
macro_rules! sfw_log_trace {
    ($msg:expr) => { tracing::trace!($msg) };
    ($format:expr, $($arg:tt)+) => { tracing::trace!($format, $($arg)+) };
}

/// `tracing::debug!` for crate internals
#[macro_export]
macro_rules! sfw_log_debug {
    ($msg:expr) => { tracing::debug!($msg) };
    ($format:expr, $($arg:tt)+) => { tracing::debug!($format, $($arg)+) };
}

/// `tracing::info!` for crate internals
#[macro_export]
macro_rules! sfw_log_info {
    ($msg:expr) => { tracing::info!($msg) };
    ($format:expr, $($arg:tt)+) => { tracing::info!($format, $($arg)+) };
}

/// `tracing::warn!` for crate internals
#[macro_export]
macro_rules! sfw_log_warn {
    ($msg:expr) => { tracing::warn!($msg) };
    ($format:expr, $($arg:tt)+) => { tracing::warn!($format, $($arg)+) };
}

/// `tracing::error!` for crate internals
#[macro_export]
macro_rules! sfw_log_error {
    ($msg:expr) => { tracing::error!($msg) };
    ($format:expr, $($arg:tt)+) => { tracing::error!($format, $($arg)+) };
}
