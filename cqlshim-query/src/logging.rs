//! Logging bootstrap.
//!
//! All crates log through `tracing`. This module installs a subscriber when
//! asked to, controlled by environment variables:
//!
//! - `CQLSHIM_DEBUG=true|1|yes` - enable debug logging
//! - `CQLSHIM_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `CQLSHIM_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! The subscriber is only installed when the `tracing-subscriber` feature is
//! enabled; otherwise the host application's subscriber (if any) receives
//! the events.
//!
//! ```rust,no_run
//! cqlshim_query::logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check if debug logging is enabled via `CQLSHIM_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    parse_debug_flag(env::var("CQLSHIM_DEBUG").ok().as_deref())
}

/// The configured log level; `debug` when debugging is on, else `warn`.
pub fn get_log_level() -> &'static str {
    resolve_level(
        env::var("CQLSHIM_LOG_LEVEL").ok().as_deref(),
        is_debug_enabled(),
    )
}

/// The configured output format; defaults to `json`.
pub fn get_log_format() -> &'static str {
    resolve_format(env::var("CQLSHIM_LOG_FORMAT").ok().as_deref())
}

fn parse_debug_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

fn resolve_level(requested: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    requested
        .map(str::to_lowercase)
        .and_then(|l| LEVELS.iter().find(|&&known| known == l).copied())
        .unwrap_or(fallback)
}

fn resolve_format(requested: Option<&str>) -> &'static str {
    match requested.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// Initialize logging from the environment. Subsequent calls are no-ops.
///
/// Nothing is installed unless `CQLSHIM_DEBUG` or `CQLSHIM_LOG_LEVEL` is set.
pub fn init() {
    if !is_debug_enabled() && env::var("CQLSHIM_LOG_LEVEL").is_err() {
        return;
    }
    init_with(get_log_level(), get_log_format());
}

/// Initialize logging with an explicit level and format.
///
/// Unknown levels fall back to `warn`, unknown formats to `json`.
pub fn init_with(level: &str, format: &str) {
    let level = resolve_level(Some(level), false);
    let format = resolve_format(Some(format));

    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "cqlshim={level},cqlshim_query={level},cqlshim_scylla={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format, "cqlshim logging initialized");
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = (level, format);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag() {
        assert!(parse_debug_flag(Some("TRUE")));
        assert!(parse_debug_flag(Some("1")));
        assert!(!parse_debug_flag(Some("no")));
        assert!(!parse_debug_flag(None));
    }

    #[test]
    fn test_level_resolution() {
        assert_eq!(resolve_level(None, false), "warn");
        assert_eq!(resolve_level(None, true), "debug");
        assert_eq!(resolve_level(Some("TRACE"), false), "trace");
        assert_eq!(resolve_level(Some("verbose"), true), "debug");
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(resolve_format(None), "json");
        assert_eq!(resolve_format(Some("Pretty")), "pretty");
        assert_eq!(resolve_format(Some("compact")), "compact");
        assert_eq!(resolve_format(Some("xml")), "json");
    }
}
