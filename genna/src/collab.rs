//! Abstract interfaces for the external collaborators steps may call:
//! a knowledge-base matcher, an intent recognizer, and a transcript
//! store. Concrete HTTP/file implementations live with the bots; the
//! engine only sees these contracts.

use crate::error::CollabResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

// ============================================================================
// Knowledge base
// ============================================================================

/// One question/answer pairing returned by a knowledge-base query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbMatch {
    /// The matched question.
    pub question: String,
    /// The stored answer.
    pub answer: String,
    /// Match confidence, higher is better.
    pub score: f64,
}

/// A knowledge-base matcher. An empty result list signals "no match".
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Query the knowledge base; results are ordered best-first.
    async fn query(&self, text: &str) -> CollabResult<Vec<KbMatch>>;
}

// ============================================================================
// Intent recognizer
// ============================================================================

/// The outcome of intent recognition over one utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recognition {
    /// The top-scoring intent name.
    pub top_intent: String,
    /// Confidence of the top intent.
    pub score: f64,
    /// Recognized entities, shape defined by the recognizer.
    #[serde(default)]
    pub entities: Value,
}

/// An intent recognizer over free-form text.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// Recognize the top intent and entities in the given text.
    async fn recognize(&self, text: &str) -> CollabResult<Recognition>;
}

// ============================================================================
// Transcript store
// ============================================================================

/// One audit event written to the transcript store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Event name (e.g. `QnAMessage`, `BotMessageReceived`).
    pub name: String,
    /// Event properties.
    pub properties: Value,
    /// Event timestamp (Unix milliseconds).
    pub timestamp: u64,
}

impl TranscriptEvent {
    /// Create an event with the current timestamp.
    #[must_use]
    pub fn new(name: impl Into<String>, properties: Value) -> Self {
        Self {
            name: name.into(),
            properties,
            timestamp: crate::util::timestamp_ms(),
        }
    }
}

/// A document store for conversation transcripts.
///
/// Writes are fire-and-forget from the caller's point of view: use
/// [`record`] so failures are logged without blocking the conversation.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Insert one event.
    async fn insert(&self, event: TranscriptEvent) -> CollabResult<()>;
}

/// Record a transcript event without blocking the turn.
///
/// The insert runs on a spawned task; failures are logged at `warn` and
/// never propagate, since auditing must not break the conversation.
pub fn record(store: &Arc<dyn TranscriptStore>, event: TranscriptEvent) {
    let store = Arc::clone(store);
    tokio::spawn(async move {
        if let Err(e) = store.insert(event).await {
            warn!(error = %e, "transcript insert failed");
        }
    });
}

/// Transcript store that keeps events in memory. Useful for tests and
/// for running with auditing disabled but inspectable.
#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    events: Mutex<Vec<TranscriptEvent>>,
}

impl MemoryTranscriptStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub async fn events(&self) -> Vec<TranscriptEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn insert(&self, event: TranscriptEvent) -> CollabResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Transcript store that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTranscriptStore;

#[async_trait]
impl TranscriptStore for NullTranscriptStore {
    async fn insert(&self, _event: TranscriptEvent) -> CollabResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_transcript() {
        let store = MemoryTranscriptStore::new();
        store
            .insert(TranscriptEvent::new("QnAMessage", json!({"Question": "hours?"})))
            .await
            .unwrap();

        let events = store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "QnAMessage");
        assert!(events[0].timestamp > 0);
    }

    #[tokio::test]
    async fn test_record_is_fire_and_forget() {
        let store: Arc<dyn TranscriptStore> = Arc::new(MemoryTranscriptStore::new());
        record(&store, TranscriptEvent::new("BotMessageSent", json!({})));
        // The spawned insert must not be required to finish before the
        // turn returns; yield once and it will have run on this executor.
        tokio::task::yield_now().await;
    }
}
