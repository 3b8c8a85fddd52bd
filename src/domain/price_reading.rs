//! Price readings and the webhook payload that carries them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Event name every price payload is tagged with.
pub const PRICE_UPDATE_EVENT: &str = "dolar_price_update";

/// One price observation taken from the upstream API.
///
/// Produced once per job run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReading {
    /// Average price in bolívares, sent as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub precio_ves: Decimal,
    /// Upstream update time (ISO-8601). Capture time when upstream omits it.
    pub fecha_consulta_api: String,
    /// Label of the rate (e.g. `"oficial"`).
    pub fuente: String,
}

/// Provenance of a job execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    /// Identifier of the scheduled job that produced the reading.
    pub acurast_job_id: String,
    /// When the job built the payload.
    pub execution_timestamp: DateTime<Utc>,
}

/// Body posted to the callback URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Always [`PRICE_UPDATE_EVENT`].
    pub event: String,
    /// The reading being reported.
    pub data: PriceReading,
    /// Execution provenance.
    pub job_metadata: JobMetadata,
}

impl JobPayload {
    /// Wraps a reading with execution provenance.
    #[must_use]
    pub fn price_update(data: PriceReading, job_id: &str, executed_at: DateTime<Utc>) -> Self {
        Self {
            event: PRICE_UPDATE_EVENT.to_string(),
            data,
            job_metadata: JobMetadata {
                acurast_job_id: job_id.to_string(),
                execution_timestamp: executed_at,
            },
        }
    }
}

/// Parses an ISO-8601 timestamp in any of the forms a `TIMESTAMPTZ` column
/// accepts.
///
/// RFC 3339 with an offset is read as-is. Date-times without an offset
/// (`T` or space separated, optional fraction) and bare dates are read as
/// UTC, a bare date as midnight.
#[must_use]
pub fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
