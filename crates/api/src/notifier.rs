//! Webhook-based change notifier.
//!
//! Posts address-change events as JSON to a configured URL. Delivery is
//! best-effort: every failure is logged and absorbed, never surfaced to
//! the refresh that produced the event.

use async_trait::async_trait;
use gatehouse_core::store::ChangeNotifier;
use gatehouse_core::types::UserId;
use serde_json::json;
use std::time::Duration;

/// HTTP client timeout for a single webhook delivery.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Build a notifier targeting `url`.
    ///
    /// # Panics
    ///
    /// Panics if `url` is empty or the HTTP client cannot be constructed;
    /// both are startup-time configuration errors.
    pub fn new(url: &str) -> Self {
        assert!(!url.is_empty(), "webhook URL must not be empty");
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build webhook HTTP client");
        Self {
            url: url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl ChangeNotifier for WebhookNotifier {
    async fn notify(&self, owner_id: UserId, old_address: &str, new_address: &str) {
        let payload = json!({
            "user_id": owner_id,
            "old_ip": old_address,
            "new_ip": new_address,
        });

        match self.client.post(&self.url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(
                    status = %resp.status(),
                    owner_id = %owner_id,
                    "webhook returned non-success status"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, owner_id = %owner_id, "webhook delivery failed");
            }
        }
    }
}

/// No-op notifier used when no webhook URL is configured.
pub struct NullNotifier;

#[async_trait]
impl ChangeNotifier for NullNotifier {
    async fn notify(&self, owner_id: UserId, old_address: &str, new_address: &str) {
        tracing::info!(
            owner_id = %owner_id,
            old_address,
            new_address,
            "address change (no webhook configured)"
        );
    }
}
