//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`Settings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::Settings;

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: Settings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid or out-of-range values are logged and ignored (fall back to
/// file/default). Bare `PORT` is honored for deployment platforms that
/// inject it, with `WAYGATE_PORT` taking precedence.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(v) = read_env_u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_u16("WAYGATE_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_string("WAYGATE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_string("WAYGATE_STATIC_DIR") {
        settings.server.static_dir = v;
    }
    if let Some(v) = read_env_string("WAYGATE_NAME") {
        settings.gateway.name = v;
    }
    if let Some(v) = read_env_string("WAYGATE_DATA_DIR") {
        settings.gateway.data_dir = v;
    }
    if let Some(v) = read_env_string("WAYGATE_PAIR_NUMBER") {
        settings.gateway.pair_number = Some(v);
    }
    if let Some(v) = read_env_u64("WAYGATE_FLUSH_INTERVAL_SECS", 1, 86_400) {
        settings.flush.interval_secs = v;
    }
    if let Some(v) = read_env_u64("WAYGATE_RETRY_BASE_DELAY_MS", 1, 600_000) {
        settings.retry.base_delay_ms = v;
    }
    if let Some(v) = read_env_u64("WAYGATE_RETRY_MAX_DELAY_MS", 1, 3_600_000) {
        settings.retry.max_delay_ms = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

fn read_env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn read_env_u16(key: &str, min: u16, max: u16) -> Option<u16> {
    let raw = std::env::var(key).ok()?;
    let parsed = parse_u16_range(&raw, min, max);
    if parsed.is_none() {
        warn!(key, value = raw.as_str(), min, max, "ignoring invalid env override");
    }
    parsed
}

fn read_env_u64(key: &str, min: u64, max: u64) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    let parsed = parse_u64_range(&raw, min, max);
    if parsed.is_none() {
        warn!(key, value = raw.as_str(), min, max, "ignoring invalid env override");
    }
    parsed
}
