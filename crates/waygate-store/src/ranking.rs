//! Ranking-state persistence.
//!
//! The flusher hands the store a snapshot of dirty group identifiers;
//! `persist` writes each one and returns the subset that FAILED so the
//! caller can re-queue them. A per-group failure never aborts the rest of
//! the flush.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waygate_core::types::GroupId;

use crate::errors::StoreResult;

/// Directory under the data dir holding ranking state.
pub const RANKING_DIR: &str = "ranking";

/// Durable store for per-group ranking state.
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Persist the given group identifiers.
    ///
    /// Returns the subset that failed to persist (empty on full success).
    /// An `Err` means nothing was persisted at all.
    async fn persist(&self, ids: &HashSet<GroupId>) -> StoreResult<HashSet<GroupId>>;
}

/// On-disk record for one group.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupRecord {
    group: GroupId,
    /// When this group was last flushed.
    flushed_at: DateTime<Utc>,
    /// How many flushes have touched this group.
    flush_count: u64,
}

/// Ranking store writing one JSON file per group.
pub struct JsonRankingStore {
    dir: PathBuf,
}

impl JsonRankingStore {
    /// Store rooted at the given data directory.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(RANKING_DIR),
        }
    }

    /// File path for one group's record.
    fn record_path(&self, id: &GroupId) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(id.as_str())))
    }

    fn persist_one(&self, id: &GroupId) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.record_path(id);

        let mut record = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str::<GroupRecord>(&data).unwrap_or_else(|e| {
                tracing::warn!(group = %id, error = %e, "corrupt ranking record, rewriting");
                GroupRecord {
                    group: id.clone(),
                    flushed_at: Utc::now(),
                    flush_count: 0,
                }
            }),
            Err(_) => GroupRecord {
                group: id.clone(),
                flushed_at: Utc::now(),
                flush_count: 0,
            },
        };
        record.flushed_at = Utc::now();
        record.flush_count += 1;

        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(&path, json)?;
        Ok(())
    }
}

#[async_trait]
impl RankingStore for JsonRankingStore {
    async fn persist(&self, ids: &HashSet<GroupId>) -> StoreResult<HashSet<GroupId>> {
        let mut failed = HashSet::new();
        for id in ids {
            if let Err(e) = self.persist_one(id) {
                tracing::warn!(group = %id, error = %e, "failed to persist group, will retry");
                let _ = failed.insert(id.clone());
            }
        }
        Ok(failed)
    }
}

/// Make a chat identifier safe to use as a file name.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> HashSet<GroupId> {
        raw.iter().map(|s| GroupId::new(*s)).collect()
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize("1234-5678@g.us"), "1234-5678_g.us");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[tokio::test]
    async fn persist_writes_one_file_per_group() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRankingStore::new(dir.path());

        let failed = store.persist(&ids(&["a@g.us", "b@g.us"])).await.unwrap();
        assert!(failed.is_empty());

        let entries: Vec<_> = std::fs::read_dir(dir.path().join(RANKING_DIR))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn repeat_persist_bumps_flush_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRankingStore::new(dir.path());
        let set = ids(&["a@g.us"]);

        let _ = store.persist(&set).await.unwrap();
        let _ = store.persist(&set).await.unwrap();

        let path = store.record_path(&GroupId::new("a@g.us"));
        let record: GroupRecord =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(record.flush_count, 2);
    }

    #[tokio::test]
    async fn empty_set_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRankingStore::new(dir.path());
        let failed = store.persist(&HashSet::new()).await.unwrap();
        assert!(failed.is_empty());
        assert!(!dir.path().join(RANKING_DIR).join("anything").exists());
    }

    #[tokio::test]
    async fn corrupt_record_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRankingStore::new(dir.path());
        let set = ids(&["a@g.us"]);

        let _ = store.persist(&set).await.unwrap();
        let path = store.record_path(&GroupId::new("a@g.us"));
        std::fs::write(&path, "{broken").unwrap();

        let failed = store.persist(&set).await.unwrap();
        assert!(failed.is_empty());
        let record: GroupRecord =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(record.flush_count, 1);
    }
}
