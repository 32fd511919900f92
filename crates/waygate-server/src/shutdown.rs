//! Graceful shutdown: one token, many tasks, bounded drain.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fans one cancellation signal out to every gateway task and drains them
/// with a deadline.
#[derive(Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Fresh, untriggered shutdown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token to hand to a task.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger shutdown. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Trigger shutdown and wait up to `timeout` for the given tasks.
    ///
    /// Tasks still running after the deadline are left to be aborted by
    /// runtime teardown; we only log that they lagged.
    pub async fn drain(&self, handles: Vec<JoinHandle<()>>, timeout: Duration) {
        self.trigger();
        info!(
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "draining gateway tasks"
        );

        let all = futures::future::join_all(handles);
        if tokio::time::timeout(timeout, all).await.is_err() {
            warn!("drain timed out after {timeout:?}, some tasks are still running");
        }
    }
}
