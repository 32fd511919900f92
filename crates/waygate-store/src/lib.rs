//! # waygate-store
//!
//! Durable storage for the gateway:
//!
//! - [`credentials`]: the session credential file (versioned JSON, 0600)
//! - [`ranking`]: the ranking-state store — `persist` reports the subset of
//!   identifiers that failed, so the flusher can retry them
//!
//! Everything here is flat JSON on disk under one data directory; there is
//! no database.

#![deny(unsafe_code)]

pub mod credentials;
pub mod errors;
pub mod ranking;

use std::path::Path;

pub use credentials::CredentialStore;
pub use errors::{StoreError, StoreResult};
pub use ranking::{JsonRankingStore, RankingStore};

/// Create the data-directory layout the stores expect.
pub fn ensure_dirs(data_dir: &Path) -> StoreResult<()> {
    std::fs::create_dir_all(data_dir.join(credentials::SESSION_DIR))?;
    std::fs::create_dir_all(data_dir.join(ranking::RANKING_DIR))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        ensure_dirs(dir.path()).unwrap();
        assert!(dir.path().join("session").is_dir());
        assert!(dir.path().join("ranking").is_dir());
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        ensure_dirs(dir.path()).unwrap();
        ensure_dirs(dir.path()).unwrap();
    }
}
