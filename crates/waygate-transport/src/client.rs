//! # Transport Client Trait
//!
//! Core abstraction over the messaging-network client library. A backend
//! implements [`TransportClient`] to open sessions and [`TransportHandle`]
//! to expose per-session operations (pairing codes today, sends tomorrow).
//!
//! `connect` hands back a [`TransportSession`]: a cheap cloneable handle
//! plus the receiving end of the session's event channel. The supervisor
//! owns the receiver; the handle is shared with the HTTP layer.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use waygate_core::types::ProtocolVersion;

use crate::errors::TransportResult;
use crate::events::{Credentials, TransportEvent};

/// One established session: shared handle + owned event stream.
pub struct TransportSession {
    /// Operations on the live session.
    pub handle: Arc<dyn TransportHandle>,
    /// Events emitted by the session, in order. The channel closing means
    /// the session is gone.
    pub events: mpsc::Receiver<TransportEvent>,
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession").finish_non_exhaustive()
    }
}

/// Factory for transport sessions.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Latest protocol version advertised by the network.
    ///
    /// Called before every connection attempt so reconnects never pin a
    /// stale version.
    async fn fetch_latest_version(&self) -> TransportResult<ProtocolVersion>;

    /// Open a session with the given version and credentials.
    async fn connect(
        &self,
        version: ProtocolVersion,
        credentials: Credentials,
    ) -> TransportResult<TransportSession>;
}

/// Operations on a live session.
#[async_trait]
pub trait TransportHandle: Send + Sync {
    /// Request a short-lived pairing code for the given phone number.
    async fn request_pairing_code(&self, number: &str) -> TransportResult<String>;

    /// Identifier of the account this session belongs to, once known.
    fn account_id(&self) -> Option<String>;
}
