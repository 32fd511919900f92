//! Dirty-set tracking and batched flushing.
//!
//! Handlers mark groups dirty as events arrive; a timer drains the set and
//! persists the snapshot. Guarantees:
//!
//! - marking is idempotent and safe concurrently with a flush
//! - an identifier stays queued from mark until a successful persist
//!   (failures are re-queued — at-least-once, never silently dropped)
//! - at most one flush is in flight; an overlapping tick is skipped

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use waygate_core::types::GroupId;
use waygate_store::RankingStore;

// ─────────────────────────────────────────────────────────────────────────────
// Dirty tracker
// ─────────────────────────────────────────────────────────────────────────────

/// Set of group identifiers with unpersisted mutations.
#[derive(Default)]
pub struct DirtyTracker {
    set: Mutex<HashSet<GroupId>>,
}

impl DirtyTracker {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a group dirty. Idempotent; returns whether it was newly marked.
    pub fn mark(&self, id: GroupId) -> bool {
        self.set.lock().insert(id)
    }

    /// Atomically take the current snapshot and clear the set.
    pub fn drain(&self) -> HashSet<GroupId> {
        std::mem::take(&mut *self.set.lock())
    }

    /// Put identifiers back for the next flush (after a failed persist).
    pub fn reinstate(&self, ids: impl IntoIterator<Item = GroupId>) {
        let mut set = self.set.lock();
        for id in ids {
            let _ = set.insert(id);
        }
    }

    /// Number of dirty identifiers.
    pub fn len(&self) -> usize {
        self.set.lock().len()
    }

    /// Whether nothing is dirty.
    pub fn is_empty(&self) -> bool {
        self.set.lock().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Flusher
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was dirty.
    Empty,
    /// Another flush was already in flight; no persistence call was made.
    Skipped,
    /// A persist ran.
    Flushed {
        /// Identifiers durably persisted.
        persisted: usize,
        /// Identifiers re-queued for the next tick.
        requeued: usize,
    },
}

/// Drains the tracker and persists snapshots, one flush at a time.
pub struct Flusher {
    tracker: Arc<DirtyTracker>,
    store: Arc<dyn RankingStore>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Flusher {
    /// Flusher over the given tracker and store.
    pub fn new(tracker: Arc<DirtyTracker>, store: Arc<dyn RankingStore>) -> Self {
        Self {
            tracker,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The tracker this flusher drains.
    pub fn tracker(&self) -> &Arc<DirtyTracker> {
        &self.tracker
    }

    /// Run one flush cycle.
    ///
    /// If a flush is already running, returns [`FlushOutcome::Skipped`]
    /// without touching the store or the tracker.
    pub async fn flush(&self) -> FlushOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("flush already in flight, skipping tick");
            return FlushOutcome::Skipped;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let snapshot = self.tracker.drain();
        if snapshot.is_empty() {
            return FlushOutcome::Empty;
        }

        match self.store.persist(&snapshot).await {
            Ok(failed) => {
                let requeued = failed.len();
                let persisted = snapshot.len() - requeued;
                if requeued > 0 {
                    warn!(requeued, "some groups failed to persist, re-queued");
                    self.tracker.reinstate(failed);
                }
                debug!(persisted, requeued, "flush cycle complete");
                FlushOutcome::Flushed { persisted, requeued }
            }
            Err(e) => {
                let requeued = snapshot.len();
                warn!(error = %e, requeued, "flush failed entirely, re-queued snapshot");
                self.tracker.reinstate(snapshot);
                FlushOutcome::Flushed {
                    persisted: 0,
                    requeued,
                }
            }
        }
    }
}

/// Spawn the recurring flush task.
///
/// Ticks at `interval` (missed ticks are skipped, not bursted) and runs one
/// last best-effort flush when the token fires, so marks made just before
/// shutdown still land on disk.
pub fn spawn_flush_task(
    flusher: Arc<Flusher>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval fires immediately; swallow the first tick so the first
        // real flush happens one full interval after startup.
        let _ = ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = flusher.flush().await;
                    debug!("flush task stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let _ = flusher.flush().await;
                }
            }
        }
    })
}
