//! Single-shot fetch of the current price from the upstream API.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::JobError;
use crate::domain::{PriceReading, parse_iso8601};

/// Upstream field holding the average price.
const PRICE_FIELD: &str = "promedio";

/// Upstream field holding the rate's last update time.
const UPDATED_AT_FIELD: &str = "fechaActualizacion";

/// Fetches one [`PriceReading`] per call. Never retries.
#[derive(Debug, Clone)]
pub struct PriceFetcher {
    client: reqwest::Client,
    source_label: String,
}

impl PriceFetcher {
    /// Creates a fetcher that labels readings with `source_label`.
    #[must_use]
    pub fn new(client: reqwest::Client, source_label: impl Into<String>) -> Self {
        Self {
            client,
            source_label: source_label.into(),
        }
    }

    /// GETs `api_url` and extracts the price.
    ///
    /// The deadline covers the whole exchange, body included. Dropping the
    /// in-flight request on timeout releases its connection.
    ///
    /// # Errors
    ///
    /// - [`JobError::Timeout`] when no complete response arrives in time
    /// - [`JobError::BadStatus`] on a non-2xx answer
    /// - [`JobError::InvalidFormat`] when the body lacks a usable price
    /// - [`JobError::Transport`] on connection failures
    pub async fn fetch_price(
        &self,
        api_url: &str,
        timeout: Duration,
    ) -> Result<PriceReading, JobError> {
        tracing::debug!(api_url, timeout_ms = timeout.as_millis() as u64, "fetching price");

        let exchange = async {
            let response = self.client.get(api_url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(JobError::BadStatus(status.as_u16()));
            }
            Ok::<_, JobError>(response.bytes().await?)
        };

        let body = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| JobError::Timeout(timeout))??;

        let reading = parse_reading(&body, &self.source_label, Utc::now())?;
        tracing::info!(
            price = %reading.precio_ves,
            source = %reading.fuente,
            updated_at = %reading.fecha_consulta_api,
            "price fetched"
        );
        Ok(reading)
    }
}

/// Extracts a reading from an upstream body.
///
/// `captured_at` stands in for the update time when upstream omits it.
/// A recognisable update time is normalised to RFC 3339 UTC; anything
/// else is forwarded untouched.
///
/// # Errors
///
/// Returns [`JobError::InvalidFormat`] when the body is not JSON or the
/// price is missing, non-numeric, or not positive.
pub fn parse_reading(
    body: &[u8],
    source_label: &str,
    captured_at: DateTime<Utc>,
) -> Result<PriceReading, JobError> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| JobError::InvalidFormat(format!("body is not JSON: {e}")))?;

    let number = json
        .get(PRICE_FIELD)
        .and_then(Value::as_number)
        .ok_or_else(|| JobError::InvalidFormat(format!("missing numeric `{PRICE_FIELD}`")))?;

    let text = number.to_string();
    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| JobError::InvalidFormat(format!("`{PRICE_FIELD}` = {text}: {e}")))?;

    if price <= Decimal::ZERO {
        return Err(JobError::InvalidFormat(format!(
            "`{PRICE_FIELD}` must be positive, got {price}"
        )));
    }

    let fecha_consulta_api = match json
        .get(UPDATED_AT_FIELD)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        Some(raw) => parse_iso8601(raw).map_or_else(
            || raw.to_string(),
            |ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
        None => captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    Ok(PriceReading {
        precio_ves: price,
        fecha_consulta_api,
        fuente: source_label.to_string(),
    })
}
