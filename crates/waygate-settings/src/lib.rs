//! # waygate-settings
//!
//! Layered configuration for the gateway. Settings are loaded from three
//! layers (in priority order):
//!
//! 1. **Compiled defaults** — [`Settings::default()`]
//! 2. **Settings file** — `waygate.json` (deep-merged over defaults)
//! 3. **Environment variables** — `WAYGATE_*` overrides (highest priority;
//!    plain `PORT` is also honored for the HTTP port)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings_from_path};
pub use types::{FlushSettings, GatewaySettings, ServerSettings, Settings};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 10_000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.gateway.name, "Waygate");
        assert_eq!(settings.flush.interval_secs, 30);
        assert_eq!(settings.retry.base_delay_ms, 1000);
    }

    #[test]
    fn deep_merge_re_exported() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"y": 2});
        let merged = deep_merge(a, b);
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }
}
