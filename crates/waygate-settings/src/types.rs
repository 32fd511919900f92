//! Settings type definitions.

use serde::{Deserialize, Serialize};
use waygate_core::retry::RetryPolicy;

/// Default HTTP port (matches the original deployment).
pub const DEFAULT_PORT: u16 = 10_000;

/// Default flush interval in seconds.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;

/// Root settings document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Gateway identity and storage settings.
    pub gateway: GatewaySettings,
    /// Ranking flush settings.
    pub flush: FlushSettings,
    /// Reconnect backoff settings.
    pub retry: RetryPolicy,
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory served as static assets (landing page lives here).
    pub static_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            static_dir: "./static".into(),
        }
    }
}

/// Gateway identity and storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySettings {
    /// Display name used in readiness logs.
    pub name: String,
    /// Root directory for session credentials and ranking state.
    pub data_dir: String,
    /// Phone number to pre-request a pairing code for at startup, if any.
    pub pair_number: Option<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            name: "Waygate".into(),
            data_dir: "./data".into(),
            pair_number: None,
        }
    }
}

/// Ranking flush settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlushSettings {
    /// Seconds between flush ticks.
    pub interval_secs: u64,
}

impl Default for FlushSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.port, settings.server.port);
        assert_eq!(back.gateway.name, settings.gateway.name);
        assert_eq!(back.flush.interval_secs, settings.flush.interval_secs);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"server": {"port": 8080}}"#).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.flush.interval_secs, 30);
    }

    #[test]
    fn pair_number_defaults_to_none() {
        let settings = Settings::default();
        assert!(settings.gateway.pair_number.is_none());
    }
}
