//! Zero-cost logging helpers.
//!
//! With the `tracing` feature enabled these macros forward to the `tracing` crate. Without
//! it they expand to nothing and their arguments are never evaluated.
//!
//! ```bash
//! cargo test --features tracing
//! ```

#![allow(unused_macros, unused_imports)]

/// Trace-level event for point operations.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level event for structural changes (splits, merges, root changes).
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
pub(crate) use trace_log;
