//! Database models for price logs and the webhook audit trail.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored row from the `dolar_price_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PriceLogRecord {
    /// Auto-increment row ID.
    pub id: i64,
    /// Price in bolívares.
    #[serde(with = "rust_decimal::serde::float")]
    pub precio_ves: Decimal,
    /// Upstream update time of the rate.
    pub fecha_consulta_api: DateTime<Utc>,
    /// Rate label (e.g. `"oficial"`).
    pub fuente: String,
    /// Job that reported the price, if it identified itself.
    pub acurast_job_id: Option<String>,
    /// When the job ran.
    pub execution_timestamp: DateTime<Utc>,
    /// Server-side receive timestamp.
    pub received_at: DateTime<Utc>,
}

/// Values for a new `dolar_price_logs` row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceLog {
    /// Price in bolívares.
    pub precio_ves: Decimal,
    /// Upstream update time of the rate.
    pub fecha_consulta_api: DateTime<Utc>,
    /// Rate label.
    pub fuente: String,
    /// Reporting job, if known.
    pub acurast_job_id: Option<String>,
    /// When the job ran.
    pub execution_timestamp: DateTime<Utc>,
}

/// Where an audit row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSource {
    /// Every request to the price webhook.
    Webhook,
    /// A price webhook whose insert failed.
    WebhookStorageError,
    /// A diagnostic posted to the debug endpoint.
    DebugEndpoint,
}

impl AuditSource {
    /// Tag stored in the `source` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::WebhookStorageError => "webhook_storage_error",
            Self::DebugEndpoint => "debug_endpoint",
        }
    }
}

impl fmt::Display for AuditSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored row from the `webhook_debug_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WebhookDebugLog {
    /// Row ID.
    pub id: Uuid,
    /// Raw inbound body; non-JSON bodies are stored as a JSON string.
    pub payload: serde_json::Value,
    /// Source tag (see [`AuditSource`]).
    pub source: String,
    /// Validation or storage error, if any.
    pub error: Option<String>,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Values for a new `webhook_debug_logs` row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWebhookDebugLog {
    /// Raw inbound body.
    pub payload: serde_json::Value,
    /// Source tag.
    pub source: AuditSource,
    /// Validation or storage error, if any.
    pub error: Option<String>,
}
