//! Connection supervisor.
//!
//! Owns the one transport session the gateway keeps alive. The run loop:
//!
//! 1. fetch the latest protocol version (fresh every attempt)
//! 2. load credentials from the store (or start empty)
//! 3. connect and publish the session handle
//! 4. drain session events until the session closes
//! 5. terminal disconnect → stop; anything else → backoff, go to 1
//!
//! Because only this loop calls `connect`, restarts are serialized — rapid
//! repeated close signals can never trigger overlapping reconnects. Attempts
//! are unbounded; spacing comes from [`waygate_core::retry`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use waygate_core::errors::{GatewayError, GatewayResult};
use waygate_core::retry::{RetryPolicy, backoff_delay};
use waygate_core::types::ConnectionState;
use waygate_store::CredentialStore;
use waygate_transport::client::{TransportClient, TransportHandle, TransportSession};
use waygate_transport::events::{
    ConnectionUpdate, Credentials, DisconnectReason, TransportEvent,
};

use crate::dispatch::Dispatcher;

// ─────────────────────────────────────────────────────────────────────────────
// Gateway service trait
// ─────────────────────────────────────────────────────────────────────────────

/// What the HTTP layer needs from the lifecycle core.
#[async_trait]
pub trait GatewayService: Send + Sync {
    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Request a pairing code for the given phone number.
    ///
    /// Fails with [`GatewayError::InvalidInput`] for an empty number,
    /// [`GatewayError::Unavailable`] when no connection handle exists, and
    /// [`GatewayError::Upstream`] for transport failures.
    async fn request_pairing_code(&self, number: &str) -> GatewayResult<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Supervisor
// ─────────────────────────────────────────────────────────────────────────────

/// Why the run loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown was requested.
    Cancelled,
    /// Credentials were invalidated; reconnecting would repeat the same
    /// failure, so the loop stops and waits for an operator.
    TerminalAuth(DisconnectReason),
}

/// How one driven session ended.
enum SessionEnd {
    Cancelled,
    Closed {
        reason: DisconnectReason,
        /// Whether the session reached `Open` (resets the backoff counter).
        was_open: bool,
    },
}

/// Owns the transport session and its lifecycle.
pub struct ConnectionSupervisor {
    client: Arc<dyn TransportClient>,
    credentials: Arc<CredentialStore>,
    policy: RetryPolicy,
    state: RwLock<ConnectionState>,
    handle: RwLock<Option<Arc<dyn TransportHandle>>>,
}

impl ConnectionSupervisor {
    /// Create a supervisor. Nothing connects until [`run`](Self::run).
    pub fn new(
        client: Arc<dyn TransportClient>,
        credentials: Arc<CredentialStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            credentials,
            policy,
            state: RwLock::new(ConnectionState::Connecting),
            handle: RwLock::new(None),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Snapshot of the current session handle, if any.
    ///
    /// The handle is published and cleared atomically, so a caller never
    /// observes one that is mid-replacement.
    pub fn handle(&self) -> Option<Arc<dyn TransportHandle>> {
        self.handle.read().clone()
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    /// Spawn the run loop on the runtime.
    pub fn spawn(
        self: Arc<Self>,
        dispatcher: Arc<Dispatcher>,
        cancel: CancellationToken,
    ) -> JoinHandle<StopReason> {
        tokio::spawn(async move { self.run(&dispatcher, cancel).await })
    }

    /// Run the connection lifecycle until cancelled or terminally stopped.
    pub async fn run(&self, dispatcher: &Dispatcher, cancel: CancellationToken) -> StopReason {
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return StopReason::Cancelled;
            }
            self.set_state(ConnectionState::Connecting);

            let version = match self.client.fetch_latest_version().await {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, attempt, "failed to fetch protocol version");
                    if !self.pause(attempt, &cancel).await {
                        return StopReason::Cancelled;
                    }
                    attempt = attempt.saturating_add(1);
                    continue;
                }
            };

            // Re-loaded every attempt so a rotation persisted by a previous
            // session is always picked up.
            let creds = self.credentials.load().unwrap_or_else(Credentials::empty);
            info!(%version, fresh_session = creds.is_empty(), "opening transport session");

            let session = match self.client.connect(version, creds).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, attempt, "transport connect failed");
                    if !self.pause(attempt, &cancel).await {
                        return StopReason::Cancelled;
                    }
                    attempt = attempt.saturating_add(1);
                    continue;
                }
            };

            *self.handle.write() = Some(Arc::clone(&session.handle));
            let end = self.drive_session(session, dispatcher, &cancel).await;
            *self.handle.write() = None;
            self.set_state(ConnectionState::Closed);

            match end {
                SessionEnd::Cancelled => return StopReason::Cancelled,
                SessionEnd::Closed { reason, was_open } => {
                    if reason.is_terminal() {
                        error!(
                            ?reason,
                            "credentials invalidated — not reconnecting, re-pair to recover"
                        );
                        return StopReason::TerminalAuth(reason);
                    }
                    if was_open {
                        attempt = 0;
                    }
                    warn!(?reason, attempt, "session closed, reconnecting");
                    if !self.pause(attempt, &cancel).await {
                        return StopReason::Cancelled;
                    }
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// Drain one session's events until it closes or shutdown is requested.
    async fn drive_session(
        &self,
        mut session: TransportSession,
        dispatcher: &Dispatcher,
        cancel: &CancellationToken,
    ) -> SessionEnd {
        let mut was_open = false;

        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => return SessionEnd::Cancelled,
                ev = session.events.recv() => ev,
            };

            let Some(event) = event else {
                // The backend dropped the channel without an explicit close
                // signal. Only an auth signal may stop the loop, so this is
                // a transient disconnect.
                return SessionEnd::Closed {
                    reason: DisconnectReason::Other("event channel closed".into()),
                    was_open,
                };
            };

            match event {
                TransportEvent::CredentialsUpdated(creds) => {
                    // Write-through: credential loss forces a re-pair.
                    if let Err(e) = self.credentials.save(&creds) {
                        error!(error = %e, "credential write-through failed — next restart may require re-pairing");
                    } else {
                        debug!("rotated credentials persisted");
                    }
                }
                TransportEvent::ConnectionUpdate(ConnectionUpdate::Connecting) => {}
                TransportEvent::ConnectionUpdate(ConnectionUpdate::Open) => {
                    was_open = true;
                    self.set_state(ConnectionState::Open);
                    info!("gateway connected");
                }
                TransportEvent::ConnectionUpdate(ConnectionUpdate::Closed { reason }) => {
                    return SessionEnd::Closed { reason, was_open };
                }
                event @ (TransportEvent::MessagesUpsert(_)
                | TransportEvent::GroupParticipantsUpdate(_)) => {
                    dispatcher.dispatch(&session.handle, event).await;
                }
            }
        }
    }

    /// Cancellable backoff sleep. Returns `false` if shutdown fired first.
    async fn pause(&self, attempt: u32, cancel: &CancellationToken) -> bool {
        let delay = backoff_delay(attempt, &self.policy);
        debug!(attempt, delay_ms = delay, "backing off before next attempt");
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(delay)) => true,
            () = cancel.cancelled() => false,
        }
    }
}

#[async_trait]
impl GatewayService for ConnectionSupervisor {
    fn connection_state(&self) -> ConnectionState {
        self.state()
    }

    async fn request_pairing_code(&self, number: &str) -> GatewayResult<String> {
        let number = number.trim();
        if number.is_empty() {
            return Err(GatewayError::InvalidInput("phone number is required".into()));
        }
        let handle = self
            .handle()
            .ok_or_else(|| GatewayError::Unavailable("no active connection".into()))?;
        handle
            .request_pairing_code(number)
            .await
            .map_err(GatewayError::upstream)
    }
}
