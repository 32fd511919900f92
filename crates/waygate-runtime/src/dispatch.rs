//! Event dispatch pipeline.
//!
//! Converts transport event batches into handler invocations. Two rules:
//!
//! - **Order**: entries within a batch are dispatched sequentially, in
//!   arrival order.
//! - **Isolation**: a handler failure is logged and never stops the rest of
//!   the batch or the lifecycle loop.
//!
//! Entries without content (protocol acks) are dropped silently — they are
//! not errors.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{trace, warn};
use waygate_core::types::{GroupUpdate, InboundMessage};
use waygate_transport::client::TransportHandle;
use waygate_transport::events::TransportEvent;

use crate::flush::DirtyTracker;

// ─────────────────────────────────────────────────────────────────────────────
// Handler traits
// ─────────────────────────────────────────────────────────────────────────────

/// Consumes one normalized inbound message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one message. Errors are logged by the pipeline, not propagated.
    async fn on_message(
        &self,
        connection: &Arc<dyn TransportHandle>,
        message: &InboundMessage,
    ) -> anyhow::Result<()>;
}

/// Consumes one group-membership update.
#[async_trait]
pub trait GroupUpdateHandler: Send + Sync {
    /// Handle one update. Errors are logged by the pipeline, not propagated.
    async fn on_group_update(
        &self,
        connection: &Arc<dyn TransportHandle>,
        update: &GroupUpdate,
    ) -> anyhow::Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Routes transport events to the registered handlers.
pub struct Dispatcher {
    messages: Arc<dyn MessageHandler>,
    groups: Arc<dyn GroupUpdateHandler>,
}

impl Dispatcher {
    /// Dispatcher over the given handlers.
    pub fn new(messages: Arc<dyn MessageHandler>, groups: Arc<dyn GroupUpdateHandler>) -> Self {
        Self { messages, groups }
    }

    /// Dispatch one transport event.
    ///
    /// Only message batches and group updates are routed; lifecycle events
    /// belong to the supervisor and are ignored here.
    pub async fn dispatch(&self, connection: &Arc<dyn TransportHandle>, event: TransportEvent) {
        match event {
            TransportEvent::MessagesUpsert(batch) => {
                for message in &batch {
                    if !message.has_content() {
                        trace!(message_id = %message.id, "dropping contentless entry");
                        continue;
                    }
                    if let Err(e) = self.messages.on_message(connection, message).await {
                        warn!(
                            message_id = %message.id,
                            chat = %message.chat,
                            error = %e,
                            "message handler failed, continuing batch"
                        );
                    }
                }
            }
            TransportEvent::GroupParticipantsUpdate(update) => {
                if let Err(e) = self.groups.on_group_update(connection, &update).await {
                    warn!(group = %update.group, error = %e, "group handler failed");
                }
            }
            TransportEvent::CredentialsUpdated(_) | TransportEvent::ConnectionUpdate(_) => {}
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Default activity handler
// ─────────────────────────────────────────────────────────────────────────────

/// Default handler wiring: marks the originating group dirty on every group
/// message and membership change, feeding the ranking flusher.
pub struct ActivityHandler {
    tracker: Arc<DirtyTracker>,
}

impl ActivityHandler {
    /// Handler feeding the given tracker.
    pub fn new(tracker: Arc<DirtyTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl MessageHandler for ActivityHandler {
    async fn on_message(
        &self,
        _connection: &Arc<dyn TransportHandle>,
        message: &InboundMessage,
    ) -> anyhow::Result<()> {
        if message.chat.is_group() {
            let _ = self.tracker.mark(message.chat.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl GroupUpdateHandler for ActivityHandler {
    async fn on_group_update(
        &self,
        _connection: &Arc<dyn TransportHandle>,
        update: &GroupUpdate,
    ) -> anyhow::Result<()> {
        let _ = self.tracker.mark(update.group.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use waygate_core::types::{GroupId, MessageContent, ParticipantAction};
    use waygate_transport::errors::TransportResult;

    struct NullHandle;

    #[async_trait]
    impl TransportHandle for NullHandle {
        async fn request_pairing_code(&self, _number: &str) -> TransportResult<String> {
            Ok(String::new())
        }
        fn account_id(&self) -> Option<String> {
            None
        }
    }

    fn handle() -> Arc<dyn TransportHandle> {
        Arc::new(NullHandle)
    }

    fn msg(id: &str, chat: &str, content: Option<MessageContent>) -> InboundMessage {
        InboundMessage {
            id: id.into(),
            chat: chat.into(),
            sender: "alice".into(),
            timestamp: Utc::now(),
            content,
        }
    }

    fn text(id: &str, chat: &str) -> InboundMessage {
        msg(id, chat, Some(MessageContent::Text { body: "hi".into() }))
    }

    /// Records invocations; fails on a configurable message id.
    struct FlakyHandler {
        seen: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl FlakyHandler {
        fn new(fail_on: Option<&str>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_on: fail_on.map(String::from),
            }
        }
    }

    #[async_trait]
    impl MessageHandler for FlakyHandler {
        async fn on_message(
            &self,
            _connection: &Arc<dyn TransportHandle>,
            message: &InboundMessage,
        ) -> anyhow::Result<()> {
            self.seen.lock().push(message.id.clone());
            if self.fail_on.as_deref() == Some(message.id.as_str()) {
                anyhow::bail!("handler exploded");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl GroupUpdateHandler for FlakyHandler {
        async fn on_group_update(
            &self,
            _connection: &Arc<dyn TransportHandle>,
            update: &GroupUpdate,
        ) -> anyhow::Result<()> {
            self.seen.lock().push(update.group.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn batch_dispatched_in_order() {
        let h = Arc::new(FlakyHandler::new(None));
        let dispatcher = Dispatcher::new(h.clone(), h.clone());

        let batch = vec![text("1", "g@g.us"), text("2", "g@g.us"), text("3", "g@g.us")];
        dispatcher
            .dispatch(&handle(), TransportEvent::MessagesUpsert(batch))
            .await;

        assert_eq!(*h.seen.lock(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn handler_failure_does_not_drop_rest_of_batch() {
        let h = Arc::new(FlakyHandler::new(Some("2")));
        let dispatcher = Dispatcher::new(h.clone(), h.clone());

        let batch = vec![text("1", "g@g.us"), text("2", "g@g.us"), text("3", "g@g.us")];
        dispatcher
            .dispatch(&handle(), TransportEvent::MessagesUpsert(batch))
            .await;

        // 2 was attempted (and failed); 1 and 3 both ran.
        assert_eq!(*h.seen.lock(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn contentless_entries_are_dropped() {
        let h = Arc::new(FlakyHandler::new(None));
        let dispatcher = Dispatcher::new(h.clone(), h.clone());

        let batch = vec![text("1", "g@g.us"), msg("ack", "g@g.us", None), text("3", "g@g.us")];
        dispatcher
            .dispatch(&handle(), TransportEvent::MessagesUpsert(batch))
            .await;

        assert_eq!(*h.seen.lock(), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn group_updates_reach_group_handler() {
        let h = Arc::new(FlakyHandler::new(None));
        let dispatcher = Dispatcher::new(h.clone(), h.clone());

        let update = GroupUpdate {
            group: "team@g.us".into(),
            action: ParticipantAction::Add,
            participants: vec!["bob".into()],
        };
        dispatcher
            .dispatch(&handle(), TransportEvent::GroupParticipantsUpdate(update))
            .await;

        assert_eq!(*h.seen.lock(), vec!["team@g.us"]);
    }

    #[tokio::test]
    async fn activity_handler_marks_groups_only() {
        let tracker = Arc::new(DirtyTracker::new());
        let activity = ActivityHandler::new(tracker.clone());
        let conn = handle();

        activity.on_message(&conn, &text("1", "team@g.us")).await.unwrap();
        activity
            .on_message(&conn, &text("2", "94771234567@s.whatsapp.net"))
            .await
            .unwrap();

        let drained = tracker.drain();
        assert_eq!(drained.len(), 1);
        assert!(drained.contains(&GroupId::new("team@g.us")));
    }

    #[tokio::test]
    async fn activity_handler_marks_on_group_update() {
        let tracker = Arc::new(DirtyTracker::new());
        let activity = ActivityHandler::new(tracker.clone());

        let update = GroupUpdate {
            group: "team@g.us".into(),
            action: ParticipantAction::Remove,
            participants: vec!["bob".into()],
        };
        activity.on_group_update(&handle(), &update).await.unwrap();

        assert_eq!(tracker.len(), 1);
    }
}
