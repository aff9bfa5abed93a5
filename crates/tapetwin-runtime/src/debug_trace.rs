#![forbid(unsafe_code)]

//! Debug tracing controlled by environment variable.
//!
//! Set `TAPETWIN_DEBUG_TRACE=1` to print timestamped delivery and listener
//! events to stderr. When unset, each call site costs one static bool load.
//!
//! ```ignore
//! use tapetwin_runtime::debug_trace;
//! debug_trace!("delivered {:?} to {} listeners", topic, count);
//! ```

use std::sync::LazyLock;
use std::time::Instant;

const ENV_VAR: &str = "TAPETWIN_DEBUG_TRACE";

static DEBUG_TRACE_ENABLED: LazyLock<bool> =
    LazyLock::new(|| flag_enabled(std::env::var(ENV_VAR).ok().as_deref()));

fn flag_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Check if debug tracing is enabled.
#[inline]
pub fn is_enabled() -> bool {
    *DEBUG_TRACE_ENABLED
}

/// Milliseconds since the first trace call.
#[inline]
pub fn elapsed_ms() -> u64 {
    START_TIME.elapsed().as_millis() as u64
}

/// Print a timestamped line to stderr when `TAPETWIN_DEBUG_TRACE=1`.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::debug_trace::is_enabled() {
            eprintln!(
                "[TWIN {:>8}ms] {}",
                $crate::debug_trace::elapsed_ms(),
                format_args!($($arg)*)
            );
        }
    };
}
