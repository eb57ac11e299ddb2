//! Webhook notifier for Bark-style push endpoints.
//!
//! A notification is delivered as
//!
//! ```text
//! POST {endpoint}
//! Content-Type: application/json
//!
//! {"title": "...", "body": "..."}
//! ```
//!
//! Only the status code of the reply is looked at.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use hostwatch_types::Notification;

use crate::AdapterError;

/// Something that can deliver a [`Notification`].
///
/// Delivery failures are returned, never panicked on; the caller decides
/// what they mean for rate limiting.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Deliver one notification.
    async fn deliver(&self, notification: &Notification) -> Result<(), AdapterError>;

    /// Returns a human-readable description of the destination.
    fn description(&self) -> &str;
}

/// Delivers notifications by POSTing JSON to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
    description: String,
}

impl WebhookNotifier {
    /// Create a builder for the webhook at `endpoint`.
    pub fn builder(endpoint: impl Into<String>) -> WebhookNotifierBuilder {
        WebhookNotifierBuilder {
            endpoint: endpoint.into(),
            timeout: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), AdapterError> {
        let payload =
            serde_json::to_vec(notification).map_err(|e| AdapterError::Parse(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`WebhookNotifier`].
#[derive(Debug)]
pub struct WebhookNotifierBuilder {
    endpoint: String,
    timeout: Option<Duration>,
}

impl WebhookNotifierBuilder {
    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the notifier.
    pub fn build(self) -> Result<WebhookNotifier, AdapterError> {
        if self.endpoint.trim().is_empty() {
            return Err(AdapterError::Unsupported(
                "webhook endpoint must not be empty".to_string(),
            ));
        }

        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(WebhookNotifier {
            client,
            description: format!("webhook: {}", redact(&self.endpoint)),
            endpoint: self.endpoint,
        })
    }
}

// The path of a push URL is usually the device key; keep it out of logs.
fn redact(endpoint: &str) -> String {
    match endpoint.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split('/').next().unwrap_or(rest);
            format!("{}://{}/…", scheme, host)
        }
        None => "…".to_string(),
    }
}
