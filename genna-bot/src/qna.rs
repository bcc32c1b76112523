//! HTTP knowledge-base client.
//!
//! Queries a hosted question-answering endpoint and maps its answer list
//! into the engine's [`KbMatch`] shape. The endpoint authenticates with
//! an `Authorization: EndpointKey {key}` header.

use async_trait::async_trait;
use genna::collab::{KbMatch, KnowledgeBase, TranscriptEvent, TranscriptStore, record};
use genna::error::{CollabError, CollabResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Answers below this score are treated as no-match.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Serialize)]
struct QnaRequest<'a> {
    question: &'a str,
    top: u32,
}

#[derive(Debug, Deserialize)]
struct QnaResponse {
    #[serde(default)]
    answers: Vec<QnaAnswer>,
}

#[derive(Debug, Deserialize)]
struct QnaAnswer {
    #[serde(default)]
    questions: Vec<String>,
    answer: String,
    score: f64,
}

/// Knowledge base backed by a hosted QnA endpoint.
#[derive(Debug, Clone)]
pub struct HttpKnowledgeBase {
    client: reqwest::Client,
    endpoint: String,
    endpoint_key: String,
    top: u32,
    score_threshold: f64,
}

impl HttpKnowledgeBase {
    /// Create a client for the given answer endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, endpoint_key: impl Into<String>) -> CollabResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CollabError::transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            endpoint_key: endpoint_key.into(),
            top: 1,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        })
    }

    /// Set how many answers to request.
    #[must_use]
    pub const fn with_top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    /// Set the minimum score an answer must reach.
    #[must_use]
    pub const fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn query(&self, text: &str) -> CollabResult<Vec<KbMatch>> {
        let request = QnaRequest {
            question: text,
            top: self.top,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("EndpointKey {}", self.endpoint_key),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| CollabError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollabError::Rejected(format!(
                "knowledge base: HTTP {}",
                response.status()
            )));
        }

        let parsed: QnaResponse = response
            .json()
            .await
            .map_err(|e| CollabError::decode(e.to_string()))?;

        let matches: Vec<KbMatch> = parsed
            .answers
            .into_iter()
            .filter(|a| a.score >= self.score_threshold)
            .map(|a| KbMatch {
                question: a.questions.into_iter().next().unwrap_or_default(),
                answer: a.answer,
                score: a.score,
            })
            .collect();

        debug!(question = %text, matches = matches.len(), "knowledge base queried");
        Ok(matches)
    }
}

/// Knowledge base that never matches. Used when no endpoint is
/// configured so "Ask Genna" degrades to the no-answer message instead
/// of failing the turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyKnowledgeBase;

#[async_trait]
impl KnowledgeBase for EmptyKnowledgeBase {
    async fn query(&self, _text: &str) -> CollabResult<Vec<KbMatch>> {
        Ok(Vec::new())
    }
}

/// Wraps a knowledge base and records a `QnAMessage` transcript event
/// for every lookup.
///
/// What gets recorded is gated by the audit flags: the question text
/// only when `log_original_message` is set, the username only when
/// `log_user_name` is set. Recording is fire-and-forget; a transcript
/// failure never affects the answer.
pub struct AuditedKnowledgeBase {
    inner: Arc<dyn KnowledgeBase>,
    transcript: Arc<dyn TranscriptStore>,
    conversation_id: String,
    username: Option<String>,
    log_user_name: bool,
    log_original_message: bool,
}

impl AuditedKnowledgeBase {
    /// Wrap a knowledge base with transcript auditing.
    pub fn new(
        inner: Arc<dyn KnowledgeBase>,
        transcript: Arc<dyn TranscriptStore>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            transcript,
            conversation_id: conversation_id.into(),
            username: None,
            log_user_name: false,
            log_original_message: false,
        }
    }

    /// Set the username recorded when `log_user_name` is enabled.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the audit flags.
    #[must_use]
    pub const fn with_audit_flags(mut self, log_user_name: bool, log_original_message: bool) -> Self {
        self.log_user_name = log_user_name;
        self.log_original_message = log_original_message;
        self
    }
}

#[async_trait]
impl KnowledgeBase for AuditedKnowledgeBase {
    async fn query(&self, text: &str) -> CollabResult<Vec<KbMatch>> {
        let matches = self.inner.query(text).await?;

        let mut properties = serde_json::Map::new();
        properties.insert(
            "ConversationId".to_string(),
            serde_json::Value::String(self.conversation_id.clone()),
        );
        if self.log_original_message {
            properties.insert(
                "Question".to_string(),
                serde_json::Value::String(text.to_string()),
            );
        }
        if self.log_user_name
            && let Some(username) = &self.username
        {
            properties.insert(
                "Username".to_string(),
                serde_json::Value::String(username.clone()),
            );
        }
        if let Some(top) = matches.first() {
            properties.insert(
                "Answer".to_string(),
                serde_json::Value::String(top.answer.clone()),
            );
            if let Some(score) = serde_json::Number::from_f64(top.score) {
                properties.insert("Score".to_string(), serde_json::Value::Number(score));
            }
        }

        record(
            &self.transcript,
            TranscriptEvent::new("QnAMessage", serde_json::Value::Object(properties)),
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genna::collab::MemoryTranscriptStore;

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "answers": [
                {"questions": ["What are your hours?"], "answer": "9 to 5, Monday through Friday.", "score": 92.5},
                {"questions": [], "answer": "No good match found in KB.", "score": 0.0}
            ]
        }"#;
        let parsed: QnaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.answers.len(), 2);
        assert_eq!(parsed.answers[0].answer, "9 to 5, Monday through Friday.");
    }

    #[test]
    fn test_request_shape() {
        let request = QnaRequest {
            question: "hours?",
            top: 1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["question"], "hours?");
        assert_eq!(json["top"], 1);
    }

    struct FixedKb;

    #[async_trait]
    impl KnowledgeBase for FixedKb {
        async fn query(&self, _text: &str) -> CollabResult<Vec<KbMatch>> {
            Ok(vec![KbMatch {
                question: "What are your hours?".into(),
                answer: "9 to 5.".into(),
                score: 92.5,
            }])
        }
    }

    #[tokio::test]
    async fn test_audit_respects_flags() {
        let transcript = Arc::new(MemoryTranscriptStore::new());
        let kb = AuditedKnowledgeBase::new(
            Arc::new(FixedKb),
            Arc::clone(&transcript) as Arc<dyn TranscriptStore>,
            "cli:direct",
        )
        .with_username("ada")
        .with_audit_flags(true, false);

        let matches = kb.query("what are your hours").await.unwrap();
        assert_eq!(matches.len(), 1);

        // Let the spawned insert run.
        tokio::task::yield_now().await;
        let events = transcript.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "QnAMessage");
        assert_eq!(events[0].properties["Username"], "ada");
        assert_eq!(events[0].properties["Answer"], "9 to 5.");
        // Question withheld: log_original_message is off.
        assert!(events[0].properties.get("Question").is_none());
    }
}
