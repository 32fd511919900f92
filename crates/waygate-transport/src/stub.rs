//! Scriptable in-process transport.
//!
//! [`StubTransport`] plays back scripted sessions and records pairing
//! requests. The runtime tests drive reconnect scenarios with it, and the
//! daemon falls back to it when no real client library is linked, so the
//! HTTP surface and lifecycle stay exercisable end to end.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;
use waygate_core::types::ProtocolVersion;

use crate::client::{TransportClient, TransportHandle, TransportSession};
use crate::errors::{TransportError, TransportResult};
use crate::events::{ConnectionUpdate, Credentials, TransportEvent};

/// Extra channel headroom so live event pushes never block.
const CHANNEL_SLACK: usize = 16;

/// One scripted session for the stub to play back.
pub struct ScriptedSession {
    /// Events delivered, in order, as soon as the session is connected.
    pub events: Vec<TransportEvent>,
    /// Keep the event channel open after the script runs out, so the test
    /// (or daemon) can push more events via [`StubTransport::push_live_event`].
    pub keep_open: bool,
}

impl ScriptedSession {
    /// A session that emits the given events and then closes its channel.
    #[must_use]
    pub fn finite(events: Vec<TransportEvent>) -> Self {
        Self {
            events,
            keep_open: false,
        }
    }

    /// A session that opens and then stays live.
    #[must_use]
    pub fn open_and_hold() -> Self {
        Self {
            events: vec![TransportEvent::ConnectionUpdate(ConnectionUpdate::Open)],
            keep_open: true,
        }
    }
}

/// How the stub answers pairing requests.
enum PairingBehavior {
    /// Generate a throwaway 8-character code.
    Generate,
    /// Always return this code.
    Fixed(String),
    /// Always fail with this message.
    Fail(String),
}

/// Scriptable transport backend.
pub struct StubTransport {
    version: ProtocolVersion,
    sessions: Mutex<VecDeque<ScriptedSession>>,
    /// When the script queue is empty, fabricate open-and-hold sessions
    /// instead of failing the connect (daemon fallback mode).
    loop_open: bool,
    connect_calls: AtomicU32,
    live_senders: Mutex<Vec<mpsc::Sender<TransportEvent>>>,
    pairing: Arc<Mutex<PairingBehavior>>,
    pairing_requests: Arc<Mutex<Vec<String>>>,
}

impl StubTransport {
    /// A stub that only plays back explicitly scripted sessions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: ProtocolVersion([2, 3000, 0]),
            sessions: Mutex::new(VecDeque::new()),
            loop_open: false,
            connect_calls: AtomicU32::new(0),
            live_senders: Mutex::new(Vec::new()),
            pairing: Arc::new(Mutex::new(PairingBehavior::Generate)),
            pairing_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A stub that always connects and holds the session open.
    #[must_use]
    pub fn always_open() -> Self {
        Self {
            loop_open: true,
            ..Self::new()
        }
    }

    /// Queue a scripted session for the next `connect` call.
    pub fn push_session(&self, session: ScriptedSession) {
        self.sessions.lock().push_back(session);
    }

    /// Answer all pairing requests with a fixed code.
    pub fn set_pairing_code(&self, code: impl Into<String>) {
        *self.pairing.lock() = PairingBehavior::Fixed(code.into());
    }

    /// Fail all pairing requests with the given message.
    pub fn fail_pairing(&self, message: impl Into<String>) {
        *self.pairing.lock() = PairingBehavior::Fail(message.into());
    }

    /// How many times `connect` has been called.
    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Phone numbers pairing codes were requested for, in order.
    pub fn pairing_requests(&self) -> Vec<String> {
        self.pairing_requests.lock().clone()
    }

    /// Push an event into the most recent still-open session.
    pub fn push_live_event(&self, event: TransportEvent) -> TransportResult<()> {
        let senders = self.live_senders.lock();
        let sender = senders.last().ok_or(TransportError::ChannelClosed)?;
        sender
            .try_send(event)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportClient for StubTransport {
    async fn fetch_latest_version(&self) -> TransportResult<ProtocolVersion> {
        Ok(self.version)
    }

    async fn connect(
        &self,
        _version: ProtocolVersion,
        _credentials: Credentials,
    ) -> TransportResult<TransportSession> {
        let _ = self.connect_calls.fetch_add(1, Ordering::SeqCst);

        let script = {
            let mut sessions = self.sessions.lock();
            match sessions.pop_front() {
                Some(s) => s,
                None if self.loop_open => {
                    debug!("script queue empty, fabricating open-and-hold session");
                    ScriptedSession::open_and_hold()
                }
                None => return Err(TransportError::Connect("no scripted session".into())),
            }
        };

        let (tx, rx) = mpsc::channel(script.events.len() + CHANNEL_SLACK);
        for event in script.events {
            tx.send(event)
                .await
                .map_err(|_| TransportError::ChannelClosed)?;
        }
        if script.keep_open {
            self.live_senders.lock().push(tx);
        }

        let handle = Arc::new(StubHandle {
            pairing: Arc::clone(&self.pairing),
            requests: Arc::clone(&self.pairing_requests),
        });

        Ok(TransportSession { handle, events: rx })
    }
}

/// Handle to a stub session.
struct StubHandle {
    pairing: Arc<Mutex<PairingBehavior>>,
    requests: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TransportHandle for StubHandle {
    async fn request_pairing_code(&self, number: &str) -> TransportResult<String> {
        self.requests.lock().push(number.to_string());
        match &*self.pairing.lock() {
            PairingBehavior::Generate => {
                let raw = uuid::Uuid::new_v4().simple().to_string();
                Ok(raw[..8].to_uppercase())
            }
            PairingBehavior::Fixed(code) => Ok(code.clone()),
            PairingBehavior::Fail(message) => Err(TransportError::Pairing(message.clone())),
        }
    }

    fn account_id(&self) -> Option<String> {
        None
    }
}
