#![forbid(unsafe_code)]

//! Logging support.
//!
//! Re-exports the `tracing` macros this crate uses when the `tracing` feature
//! is enabled. Without the feature the same macro names expand to nothing, so
//! call sites never need a `cfg`.

#[cfg(feature = "tracing")]
pub use tracing::{trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}
