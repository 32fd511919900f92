//! Core data shapes shared across the gateway.
//!
//! These are the normalized forms that transport events are converted into
//! before they reach handlers. Wire-format details stay inside the transport
//! implementation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Suffix the messaging network uses for group chat identifiers.
const GROUP_ID_SUFFIX: &str = "@g.us";

/// Identifier of a chat (group or direct) on the messaging network.
///
/// Group chats carry the network's group suffix; everything else is a
/// direct chat. The ranking flusher only ever persists group identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Wrap a raw chat identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier names a group chat.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.0.ends_with(GROUP_ID_SUFFIX)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Protocol version
// ─────────────────────────────────────────────────────────────────────────────

/// Protocol version triple advertised by the transport library.
///
/// Re-fetched on every connection attempt so a reconnect never reuses a
/// stale version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub [u32; 3]);

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0[0], self.0[1], self.0[2])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection state
// ─────────────────────────────────────────────────────────────────────────────

/// State of the single managed transport session.
///
/// Exactly one instance exists, owned by the connection supervisor. A
/// transition to [`Closed`](ConnectionState::Closed) always decides
/// reconnect-or-stop before any further transport call is issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    /// A session is being established.
    Connecting,
    /// The session is live and events are flowing.
    Open,
    /// The session is gone (reconnecting or stopped).
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound events
// ─────────────────────────────────────────────────────────────────────────────

/// Content carried by an inbound message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    /// Plain text body.
    Text {
        /// The message text.
        body: String,
    },
    /// Media attachment (image, audio, document, ...).
    Media {
        /// Media kind as reported by the network.
        kind: String,
        /// Optional caption.
        caption: Option<String>,
    },
}

/// One normalized inbound message.
///
/// Entries with `content: None` are protocol-level stubs (delivery acks,
/// history placeholders) and are dropped by the dispatch pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Network-assigned message id.
    pub id: String,
    /// Chat the message arrived in.
    pub chat: GroupId,
    /// Sender identifier.
    pub sender: String,
    /// Server timestamp.
    pub timestamp: DateTime<Utc>,
    /// Message content, absent for protocol stubs.
    pub content: Option<MessageContent>,
}

impl InboundMessage {
    /// Whether this entry carries real content worth dispatching.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

/// Kind of group-membership change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantAction {
    /// Participants joined or were added.
    Add,
    /// Participants left or were removed.
    Remove,
    /// Participants were promoted to admin.
    Promote,
    /// Participants were demoted from admin.
    Demote,
}

/// One group-membership update event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    /// The affected group.
    pub group: GroupId,
    /// What happened.
    pub action: ParticipantAction,
    /// Affected participant identifiers.
    pub participants: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_id_detects_groups() {
        assert!(GroupId::new("1234-5678@g.us").is_group());
        assert!(!GroupId::new("94771234567@s.whatsapp.net").is_group());
    }

    #[test]
    fn group_id_display_is_raw() {
        let id = GroupId::new("abc@g.us");
        assert_eq!(id.to_string(), "abc@g.us");
        assert_eq!(id.as_str(), "abc@g.us");
    }

    #[test]
    fn protocol_version_display() {
        let v = ProtocolVersion([2, 3000, 1023]);
        assert_eq!(v.to_string(), "2.3000.1023");
    }

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Open.to_string(), "open");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }

    #[test]
    fn message_without_content_is_stub() {
        let msg = InboundMessage {
            id: "A1".into(),
            chat: "x@g.us".into(),
            sender: "alice".into(),
            timestamp: Utc::now(),
            content: None,
        };
        assert!(!msg.has_content());
    }

    #[test]
    fn message_serde_roundtrip() {
        let msg = InboundMessage {
            id: "A1".into(),
            chat: "x@g.us".into(),
            sender: "alice".into(),
            timestamp: Utc::now(),
            content: Some(MessageContent::Text {
                body: "hello".into(),
            }),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: InboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn group_update_serde_uses_camel_case() {
        let update = GroupUpdate {
            group: "g@g.us".into(),
            action: ParticipantAction::Add,
            participants: vec!["bob".into()],
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["action"], "add");
        assert_eq!(json["group"], "g@g.us");
    }
}
