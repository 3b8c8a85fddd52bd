//! JSON POST delivery with a per-call deadline.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use super::JobError;

/// Result of a delivery that reached the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryResult {
    /// `true` iff `status` is 2xx.
    pub ok: bool,
    /// Status code exactly as the receiver sent it.
    pub status: u16,
}

/// Posts payloads to a callback URL. Never retries.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    /// Creates a dispatcher on top of a shared HTTP client.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POSTs `payload` as JSON to `callback_url`.
    ///
    /// A non-2xx answer is reported through [`DeliveryResult::ok`], not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Timeout`] when the receiver does not answer
    /// within `timeout`, and [`JobError::Transport`] when the request
    /// cannot be sent at all.
    pub async fn deliver<T>(
        &self,
        callback_url: &str,
        payload: &T,
        timeout: Duration,
    ) -> Result<DeliveryResult, JobError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload)
            .map_err(|e| JobError::InvalidFormat(format!("payload not serializable: {e}")))?;

        let request = self
            .client
            .post(callback_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send();

        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| JobError::Timeout(timeout))??;

        let status = response.status();
        tracing::debug!(callback_url, status = status.as_u16(), "delivery answered");

        Ok(DeliveryResult {
            ok: status.is_success(),
            status: status.as_u16(),
        })
    }
}
