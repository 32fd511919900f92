//! Settings error types.

use thiserror::Error;

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors from loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading the settings file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file contains invalid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
