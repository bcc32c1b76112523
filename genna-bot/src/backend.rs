//! REST client for the claims backend.
//!
//! The backend exposes claim status lookups and profile/claim update
//! submissions. Update endpoints answer with a bare `1` body on
//! success; that sentinel is converted to [`UpdateOutcome`] here so the
//! dialogs only ever see the enum.

use async_trait::async_trait;
use genna::error::{CollabError, CollabResult};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Whether the backend accepted a submitted update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The backend stored the update.
    Accepted,
    /// The backend answered but did not store the update.
    Rejected,
}

impl UpdateOutcome {
    /// Whether the update was stored.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Phone number update payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneUpdate {
    /// Backend user id.
    pub user_id: String,
    /// Which number is being changed (Home, Mobile, Work).
    pub phone_type: String,
    /// The new number, digits only.
    pub number: String,
}

/// Email address update payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailUpdate {
    /// Backend user id.
    pub user_id: String,
    /// The new address.
    pub email: String,
}

/// Mailing address update payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUpdate {
    /// Backend user id.
    pub user_id: String,
    /// Street line.
    pub street: String,
    /// City name.
    pub city: String,
    /// State abbreviation.
    pub state: String,
    /// Postal code.
    pub zip: String,
}

/// Free-text claim status update payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatusUpdate {
    /// Backend user id.
    pub user_id: String,
    /// The claimant's message.
    pub data: String,
}

/// The claims backend contract the dialogs call.
#[async_trait]
pub trait ClaimApi: Send + Sync {
    /// Fetch the current claim status line for a user. `None` means the
    /// backend knows no claim for this user.
    async fn claim_status(&self, user_id: &str) -> CollabResult<Option<String>>;

    /// Submit a free-text update against the user's claim.
    async fn post_claim_update(&self, update: &ClaimStatusUpdate) -> CollabResult<UpdateOutcome>;

    /// Submit a phone number change.
    async fn post_phone(&self, update: &PhoneUpdate) -> CollabResult<UpdateOutcome>;

    /// Submit an email address change.
    async fn post_email(&self, update: &EmailUpdate) -> CollabResult<UpdateOutcome>;

    /// Submit a mailing address change.
    async fn post_address(&self, update: &AddressUpdate) -> CollabResult<UpdateOutcome>;
}

/// HTTP implementation of [`ClaimApi`] over the claims REST service.
#[derive(Debug, Clone)]
pub struct ClaimApiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl ClaimApiClient {
    /// Default number of retries after a transport failure.
    const DEFAULT_MAX_RETRIES: u32 = 2;

    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> CollabResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CollabError::transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the retry budget for transport failures.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Rebuild the HTTP client with a different request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> CollabResult<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollabError::transport(e.to_string()))?;
        Ok(self)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a JSON payload, retrying transport failures, and map the
    /// backend's success sentinel to an outcome.
    async fn post_update<T: Serialize + Sync>(
        &self,
        path: &str,
        payload: &T,
    ) -> CollabResult<UpdateOutcome> {
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            match self.client.post(&url).json(payload).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(CollabError::Rejected(format!("{path}: HTTP {status}")));
                    }
                    let body = response
                        .text()
                        .await
                        .map_err(|e| CollabError::decode(e.to_string()))?;
                    debug!(path = %path, body = %body.trim(), "backend update response");
                    // The backend answers "1" when the update was stored.
                    return Ok(if body.trim() == "1" {
                        UpdateOutcome::Accepted
                    } else {
                        UpdateOutcome::Rejected
                    });
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(path = %path, attempt, error = %e, "backend request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                Err(e) => return Err(CollabError::transport(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl ClaimApi for ClaimApiClient {
    async fn claim_status(&self, user_id: &str) -> CollabResult<Option<String>> {
        let url = self.url(&format!("/claim/{user_id}"));
        let mut attempt = 0;
        loop {
            match self.client.get(&url).send().await {
                Ok(response) => {
                    if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if !response.status().is_success() {
                        return Err(CollabError::Rejected(format!(
                            "claim status: HTTP {}",
                            response.status()
                        )));
                    }
                    let body = response
                        .text()
                        .await
                        .map_err(|e| CollabError::decode(e.to_string()))?;
                    let body = body.trim().trim_matches('"').to_string();
                    return Ok(if body.is_empty() { None } else { Some(body) });
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "claim status request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                Err(e) => return Err(CollabError::transport(e.to_string())),
            }
        }
    }

    async fn post_claim_update(&self, update: &ClaimStatusUpdate) -> CollabResult<UpdateOutcome> {
        self.post_update("/claim/ClaimStatusUpdate", update).await
    }

    async fn post_phone(&self, update: &PhoneUpdate) -> CollabResult<UpdateOutcome> {
        self.post_update("/userprofile/Phone", update).await
    }

    async fn post_email(&self, update: &EmailUpdate) -> CollabResult<UpdateOutcome> {
        self.post_update("/userprofile/Email", update).await
    }

    async fn post_address(&self, update: &AddressUpdate) -> CollabResult<UpdateOutcome> {
        self.post_update("/userprofile/Address", update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = ClaimApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.url("/claim/42"), "http://localhost:3000/claim/42");
    }

    #[test]
    fn test_payload_shape() {
        let update = PhoneUpdate {
            user_id: "42".into(),
            phone_type: "Mobile".into(),
            number: "5551234567".into(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["userId"], "42");
        assert_eq!(json["phoneType"], "Mobile");
        assert_eq!(json["number"], "5551234567");
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(UpdateOutcome::Accepted.is_accepted());
        assert!(!UpdateOutcome::Rejected.is_accepted());
    }
}
