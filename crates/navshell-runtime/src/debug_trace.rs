#![forbid(unsafe_code)]

//! Debug tracing controlled by an environment variable.
//!
//! Set `NAVSHELL_DEBUG_TRACE=1` before launching to get timestamped runtime
//! internals (subscription starts/stops, loop heartbeats) on stderr. When
//! disabled (the default) each trace point is a single static bool load.
//!
//! ```ignore
//! use navshell_runtime::debug_trace;
//! debug_trace!("loop iteration {}", count);
//! ```

use std::sync::LazyLock;
use std::time::Instant;

static DEBUG_TRACE_ENABLED: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("NAVSHELL_DEBUG_TRACE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Check if debug tracing is enabled.
#[inline]
pub fn is_enabled() -> bool {
    *DEBUG_TRACE_ENABLED
}

/// Milliseconds since the first trace call, for correlating output across threads.
#[inline]
pub fn elapsed_ms() -> u64 {
    START_TIME.elapsed().as_millis() as u64
}

/// Conditionally print a timestamped debug line to stderr.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::debug_trace::is_enabled() {
            eprintln!(
                "[NAVSHELL {:>8}ms] {}",
                $crate::debug_trace::elapsed_ms(),
                format_args!($($arg)*)
            );
        }
    };
}
