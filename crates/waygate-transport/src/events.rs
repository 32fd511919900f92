//! Transport event union and credential bundle.
//!
//! The transport backend converts its library-specific callbacks into this
//! stable union; the supervisor and dispatch pipeline never see anything
//! else. Consumed exactly once, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waygate_core::types::{GroupUpdate, InboundMessage};

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

/// Schema version of the credential bundle this build understands.
pub const CREDENTIALS_VERSION: u32 = 1;

/// Opaque session credential bundle.
///
/// The `material` payload belongs to the transport library; the gateway
/// only moves it between the network and the credential store. Losing it
/// forces a re-pair, which is why saves are write-through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Bundle schema version.
    pub version: u32,
    /// Library-defined secret material.
    pub material: serde_json::Value,
    /// When the bundle was last rotated.
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    /// A fresh, empty bundle for a first-time connection.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: CREDENTIALS_VERSION,
            material: serde_json::Value::Null,
            updated_at: Utc::now(),
        }
    }

    /// Whether this bundle has ever been populated by the network.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.material.is_null()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Disconnect classification
// ─────────────────────────────────────────────────────────────────────────────

/// Why a session closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum DisconnectReason {
    /// The account was logged out on another device.
    LoggedOut,
    /// The network rejected the stored credentials.
    AuthInvalidated,
    /// The underlying link dropped.
    NetworkLost,
    /// The library hit a transient protocol error.
    ProtocolError,
    /// Anything else the backend reports.
    Other(String),
}

impl DisconnectReason {
    /// Whether reconnecting would only repeat the same credential failure.
    ///
    /// Terminal reasons stop the supervisor; everything else reconnects.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LoggedOut | Self::AuthInvalidated)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event union
// ─────────────────────────────────────────────────────────────────────────────

/// Connection-state signal from the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionUpdate {
    /// The backend started establishing the session.
    Connecting,
    /// The session is live.
    Open,
    /// The session closed.
    Closed {
        /// Why it closed.
        reason: DisconnectReason,
    },
}

/// One event emitted by a live transport session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// The credential bundle rotated; persist immediately.
    CredentialsUpdated(Credentials),
    /// Connection-state change.
    ConnectionUpdate(ConnectionUpdate),
    /// A batch of inbound messages, in arrival order.
    MessagesUpsert(Vec<InboundMessage>),
    /// A group-membership change.
    GroupParticipantsUpdate(GroupUpdate),
}
