//! Dialog service - consumes inbound messages and drives turns.
//!
//! The service is the bus-facing analog of the engine's turn runner:
//! it resolves the conversation and user for each inbound message, runs
//! the turn, publishes every reply, and records per-turn audit events.
//! An engine failure produces an apology and a conversation reset so the
//! next message starts the root dialog fresh.

use crate::bus::MessageBus;
use crate::dialogs::AuditFlags;
use crate::error::Result;
use crate::events::{InboundMessage, OutboundMessage};
use genna::collab::{TranscriptEvent, TranscriptStore, record};
use genna::runner::TurnRunner;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Sent when a turn fails outright; the conversation restarts after it.
pub const APOLOGY_TEXT: &str =
    "I'm sorry, something went wrong on my end. Let's start over.";

/// Drives dialog turns for messages arriving on the bus.
pub struct DialogService {
    bus: MessageBus,
    runner: Arc<TurnRunner>,
    transcript: Arc<dyn TranscriptStore>,
    audit: AuditFlags,
    running: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for DialogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogService")
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

impl DialogService {
    /// Create a service over the given bus and runner.
    pub fn new(
        bus: MessageBus,
        runner: Arc<TurnRunner>,
        transcript: Arc<dyn TranscriptStore>,
        audit: AuditFlags,
    ) -> Self {
        Self {
            bus,
            runner,
            transcript,
            audit,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Run the service loop, consuming messages from the bus.
    ///
    /// Each message is processed on its own task; the runner serializes
    /// turns per conversation, so different conversations proceed in
    /// parallel while one conversation's turns stay ordered.
    ///
    /// # Errors
    ///
    /// The loop itself only returns `Ok`; per-message failures are
    /// answered with an apology and logged.
    pub async fn run(&self) -> Result<()> {
        *self.running.write().await = true;
        info!("dialog service started");

        while *self.running.read().await {
            let Some(msg) = self
                .bus
                .consume_inbound_timeout(Duration::from_secs(1))
                .await
            else {
                continue;
            };

            let bus = self.bus.clone();
            let runner = Arc::clone(&self.runner);
            let transcript = Arc::clone(&self.transcript);
            let audit = self.audit;
            tokio::spawn(async move {
                process_message(&bus, &runner, &transcript, audit, &msg).await;
            });
        }

        info!("dialog service stopped");
        Ok(())
    }

    /// Stop the service loop.
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    /// Check if the loop is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Process one message synchronously. Used by the loop's spawned
    /// tasks and directly by tests.
    pub async fn handle_message(&self, msg: &InboundMessage) {
        process_message(&self.bus, &self.runner, &self.transcript, self.audit, msg).await;
    }
}

async fn process_message(
    bus: &MessageBus,
    runner: &Arc<TurnRunner>,
    transcript: &Arc<dyn TranscriptStore>,
    audit: AuditFlags,
    msg: &InboundMessage,
) {
    let conversation_id = msg.conversation_key();
    debug!(
        conversation = %conversation_id,
        sender = %msg.sender_id,
        "processing message"
    );

    if audit.enabled {
        record(
            transcript,
            TranscriptEvent::new("BotMessageReceived", received_properties(audit, msg)),
        );
    }

    adopt_display_name(runner, msg).await;

    match runner
        .handle_turn(&conversation_id, &msg.sender_id, &msg.content)
        .await
    {
        Ok(replies) => {
            for reply in replies {
                if audit.enabled {
                    record(
                        transcript,
                        TranscriptEvent::new(
                            "BotMessageSent",
                            json!({ "ConversationId": conversation_id, "Text": reply }),
                        ),
                    );
                }
                if let Err(e) = bus.publish_outbound(OutboundMessage::reply_to(msg, reply)).await {
                    error!(error = %e, "failed to publish reply");
                }
            }
        }
        Err(e) => {
            error!(
                conversation = %conversation_id,
                error = %e,
                "turn failed, resetting conversation"
            );
            if let Err(reset_err) = runner.reset_conversation(&conversation_id).await {
                error!(error = %reset_err, "conversation reset failed");
            }
            let _ = bus
                .publish_outbound(OutboundMessage::reply_to(msg, APOLOGY_TEXT))
                .await;
        }
    }
}

fn received_properties(audit: AuditFlags, msg: &InboundMessage) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "ConversationId".to_string(),
        serde_json::Value::String(msg.conversation_key()),
    );
    if audit.log_original_message {
        properties.insert(
            "Text".to_string(),
            serde_json::Value::String(msg.content.clone()),
        );
    }
    if audit.log_user_name
        && let Some(name) = &msg.sender_name
    {
        properties.insert("Username".to_string(), serde_json::Value::String(name.clone()));
    }
    serde_json::Value::Object(properties)
}

/// Store the channel-provided display name on first contact so dialogs
/// and audit events can use it.
async fn adopt_display_name(runner: &Arc<TurnRunner>, msg: &InboundMessage) {
    let Some(name) = &msg.sender_name else { return };

    // Only existing profiles are touched; the runner creates new ones
    // with the configured default role on the first turn.
    let store = runner.store();
    match store.load_profile(&msg.sender_id).await {
        Ok(Some(mut profile)) if profile.display_name.is_none() => {
            profile.display_name = Some(name.clone());
            if let Err(e) = store.save_profile(&profile).await {
                error!(error = %e, "failed to save display name");
            }
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "failed to load profile"),
    }
}
