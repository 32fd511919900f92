//! Credential file I/O.
//!
//! Reads and writes `<data_dir>/session/credentials.json` with secure file
//! permissions (0o600). A missing, unreadable, or corrupt file is treated
//! as "no stored session" — the gateway then starts a fresh pairing flow
//! instead of refusing to boot.

use std::path::{Path, PathBuf};

use waygate_transport::events::{CREDENTIALS_VERSION, Credentials};

use crate::errors::StoreResult;

/// Directory under the data dir holding session state.
pub const SESSION_DIR: &str = "session";

/// Credential file name.
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Durable storage for the session credential bundle.
///
/// Saves are write-through: the supervisor calls [`CredentialStore::save`]
/// on every `credentials-updated` signal, never batched.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store rooted at the given data directory.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_DIR).join(CREDENTIALS_FILE_NAME),
        }
    }

    /// Path of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential bundle.
    ///
    /// Returns `None` if the file doesn't exist, can't be read, fails to
    /// parse, or carries an unsupported schema version. Every non-missing
    /// failure is logged — silently losing a session is worth noticing.
    #[must_use]
    pub fn load(&self) -> Option<Credentials> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read credential file");
                return None;
            }
        };

        match serde_json::from_str::<Credentials>(&data) {
            Ok(creds) if creds.version == CREDENTIALS_VERSION => Some(creds),
            Ok(creds) => {
                tracing::warn!(
                    version = creds.version,
                    "unsupported credential schema version, starting fresh"
                );
                None
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to parse credential file");
                None
            }
        }
    }

    /// Persist the credential bundle.
    ///
    /// Creates parent directories if needed. Sets file permissions to 0o600.
    pub fn save(&self, credentials: &Credentials) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }
}
