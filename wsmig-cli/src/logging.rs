//! Logging infrastructure for wsmig.
//!
//! Progress of a migration is reported through `tracing` events emitted by
//! the engine. This module installs the subscriber that renders them.
//!
//! # Environment Variables
//!
//! - `WSMIG_DEBUG=true` - Enable debug logging
//! - `WSMIG_DEBUG=1` - Enable debug logging
//! - `WSMIG_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `WSMIG_LOG_FORMAT=json|pretty|compact` - Set output format (default: compact)
//!
//! Logs go to stderr so command output on stdout stays clean.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `WSMIG_DEBUG`.
///
/// Returns `true` if `WSMIG_DEBUG` is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("WSMIG_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `WSMIG_LOG_LEVEL`.
///
/// Defaults to "debug" if `WSMIG_DEBUG` is enabled, otherwise "info".
pub fn get_log_level() -> &'static str {
    parse_level(env::var("WSMIG_LOG_LEVEL").ok().as_deref(), is_debug_enabled())
}

/// Get the configured log format from `WSMIG_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    parse_format(env::var("WSMIG_LOG_FORMAT").ok().as_deref())
}

fn parse_level(value: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "info" };
    match value.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

fn parse_format(value: Option<&str>) -> &'static str {
    match value.map(str::to_lowercase).as_deref() {
        Some("json") => "json",
        Some("pretty") => "pretty",
        _ => "compact",
    }
}

/// Initialize the wsmig logging system.
///
/// This should be called once at application startup. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let level = get_log_level();
        let filter = EnvFilter::try_new(format!("wsmig_cli={},wsmig_migrate={}", level, level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

        match get_log_format() {
            "json" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.json())
                    .init();
            }
            "pretty" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.pretty())
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.compact())
                    .init();
            }
        }

        tracing::debug!(level, format = get_log_format(), "wsmig logging initialized");
    });
}
