//! HTTP intent recognizer client.
//!
//! Sends an utterance to a hosted language-understanding endpoint and
//! maps the top-scoring intent into the engine's [`Recognition`] shape.

use async_trait::async_trait;
use genna::collab::{IntentRecognizer, Recognition};
use genna::error::{CollabError, CollabResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Intent name reported when nothing scored.
pub const NONE_INTENT: &str = "None";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LuisResponse {
    top_scoring_intent: Option<ScoredIntent>,
    #[serde(default)]
    entities: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ScoredIntent {
    intent: String,
    score: f64,
}

/// Intent recognizer backed by a hosted understanding endpoint.
#[derive(Debug, Clone)]
pub struct HttpIntentRecognizer {
    client: reqwest::Client,
    endpoint: String,
    subscription_key: String,
}

impl HttpIntentRecognizer {
    /// Create a recognizer client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        subscription_key: impl Into<String>,
    ) -> CollabResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CollabError::transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            subscription_key: subscription_key.into(),
        })
    }
}

#[async_trait]
impl IntentRecognizer for HttpIntentRecognizer {
    async fn recognize(&self, text: &str) -> CollabResult<Recognition> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("subscription-key", self.subscription_key.as_str()),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| CollabError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollabError::Rejected(format!(
                "recognizer: HTTP {}",
                response.status()
            )));
        }

        let parsed: LuisResponse = response
            .json()
            .await
            .map_err(|e| CollabError::decode(e.to_string()))?;

        let recognition = match parsed.top_scoring_intent {
            Some(scored) => Recognition {
                top_intent: scored.intent,
                score: scored.score,
                entities: parsed.entities,
            },
            None => Recognition {
                top_intent: NONE_INTENT.to_string(),
                score: 0.0,
                entities: parsed.entities,
            },
        };

        debug!(utterance = %text, intent = %recognition.top_intent, score = recognition.score, "intent recognized");
        Ok(recognition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "query": "where is my claim",
            "topScoringIntent": {"intent": "ClaimStatus", "score": 0.87},
            "entities": []
        }"#;
        let parsed: LuisResponse = serde_json::from_str(json).unwrap();
        let top = parsed.top_scoring_intent.unwrap();
        assert_eq!(top.intent, "ClaimStatus");
        assert!(top.score > 0.8);
    }

    #[test]
    fn test_missing_intent_tolerated() {
        let parsed: LuisResponse = serde_json::from_str(r#"{"query": "hm"}"#).unwrap();
        assert!(parsed.top_scoring_intent.is_none());
    }
}
