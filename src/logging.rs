//! Logging setup for applications embedding givemedata.
//!
//! Library code always logs through `tracing`. This module only installs a
//! subscriber, and only when the `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `GIVEMEDATA_DEBUG=true|1|yes` - Enable debug logging
//! - `GIVEMEDATA_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `GIVEMEDATA_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use givemedata::logging;
//!
//! // Call once at startup; later calls are no-ops
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "GIVEMEDATA_DEBUG";
const LEVEL_VAR: &str = "GIVEMEDATA_LOG_LEVEL";
const FORMAT_VAR: &str = "GIVEMEDATA_LOG_FORMAT";

/// Check if debug logging is enabled via `GIVEMEDATA_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    debug_enabled_in(|name| env::var(name).ok())
}

/// Log level from `GIVEMEDATA_LOG_LEVEL`, falling back to "debug" when
/// `GIVEMEDATA_DEBUG` is on and "warn" otherwise.
pub fn get_log_level() -> &'static str {
    log_level_in(|name| env::var(name).ok())
}

/// Log format from `GIVEMEDATA_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    log_format_in(|name| env::var(name).ok())
}

fn debug_enabled_in(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn log_level_in(lookup: impl Fn(&str) -> Option<String>) -> &'static str {
    let fallback = if debug_enabled_in(&lookup) { "debug" } else { "warn" };
    match lookup(LEVEL_VAR).map(|l| l.to_lowercase()).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

fn log_format_in(lookup: impl Fn(&str) -> Option<String>) -> &'static str {
    match lookup(FORMAT_VAR).map(|f| f.to_lowercase()).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// Install the givemedata subscriber.
///
/// Does nothing unless `GIVEMEDATA_DEBUG` or `GIVEMEDATA_LOG_LEVEL` is set.
pub fn init() {
    if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
        return;
    }
    install(get_log_level());
}

/// Install the givemedata subscriber at `level`, ignoring the environment.
pub fn init_with_level(level: &str) {
    let level = log_level_in(|name| (name == LEVEL_VAR).then(|| level.to_string()));
    install(level);
}

fn install(level: &'static str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "givemedata={level},givemedata_core={level},givemedata_postgres={level},givemedata_cassandra={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let format = get_log_format();
            let registry = tracing_subscriber::registry().with(filter);
            let installed = match format {
                "json" => registry.with(fmt::layer().json()).try_init(),
                "compact" => registry.with(fmt::layer().compact()).try_init(),
                _ => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format, "givemedata logging initialized");
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = level;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_debug_disabled_by_default() {
        assert!(!debug_enabled_in(env_of(&[])));
        assert!(debug_enabled_in(env_of(&[("GIVEMEDATA_DEBUG", "YES")])));
        assert!(!debug_enabled_in(env_of(&[("GIVEMEDATA_DEBUG", "0")])));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level_in(env_of(&[])), "warn");
        assert_eq!(log_level_in(env_of(&[("GIVEMEDATA_DEBUG", "1")])), "debug");
        assert_eq!(
            log_level_in(env_of(&[("GIVEMEDATA_LOG_LEVEL", "Info")])),
            "info"
        );
        assert_eq!(
            log_level_in(env_of(&[("GIVEMEDATA_LOG_LEVEL", "loud")])),
            "warn"
        );
    }

    #[test]
    fn test_log_format() {
        assert_eq!(log_format_in(env_of(&[])), "json");
        assert_eq!(
            log_format_in(env_of(&[("GIVEMEDATA_LOG_FORMAT", "compact")])),
            "compact"
        );
    }
}
