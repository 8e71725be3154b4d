//! Logging setup shared by the bucketfs crates
//!
//! Events are written with `emit` and rendered to stderr by `emit_term`.
//! The level comes from the `BUCKETFS_LOG` environment variable:
//! - `off` (default) - no logs
//! - `error`, `warn`, `info` - progressively more detail
//! - `debug` - per-call spans and store round-trips

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV: &str = "BUCKETFS_LOG";

static INIT: Once = Once::new();

/// Parsed value of `BUCKETFS_LOG`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Level(emit::Level),
    /// Unrecognised value; logging falls back to info
    Unknown,
}

/// Map a `BUCKETFS_LOG` value to a setting. Matching is case-insensitive.
pub fn parse_log_setting(value: &str) -> LogSetting {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" | "none" => LogSetting::Off,
        "debug" => LogSetting::Level(emit::Level::Debug),
        "info" => LogSetting::Level(emit::Level::Info),
        "warn" | "warning" => LogSetting::Level(emit::Level::Warn),
        "error" => LogSetting::Level(emit::Level::Error),
        _ => LogSetting::Unknown,
    }
}

/// Initialize diagnostics from the `BUCKETFS_LOG` environment variable
///
/// Call once at startup; later calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let value = std::env::var(LOG_ENV).unwrap_or_default();
        let setting = parse_log_setting(&value);

        let min = match setting {
            LogSetting::Off => return,
            LogSetting::Level(level) => level,
            LogSetting::Unknown => emit::Level::Info,
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min))
            .init();

        if setting == LogSetting::Unknown {
            emit::warn!("unknown {var} value {value}, using info", var: LOG_ENV, value);
        }

        // The runtime lives for the rest of the process.
        std::mem::forget(rt);
    });
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

/// Operations a user may want to see in normal usage
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Per-call detail: store round-trips, cache hits, listing sizes
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Recoverable conditions such as retried store calls
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Failures surfaced to the caller
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}
