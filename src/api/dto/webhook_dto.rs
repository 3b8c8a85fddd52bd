//! Inbound webhook DTOs.
//!
//! Every field is optional at the serde level so that a malformed payload
//! still parses far enough to report *which* fields are missing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /webhook`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WebhookRequest {
    /// Event name, e.g. `"dolar_price_update"`.
    #[serde(default)]
    pub event: Option<String>,
    /// The price reading.
    #[serde(default)]
    pub data: Option<PriceDataDto>,
    /// Execution provenance.
    #[serde(default)]
    pub job_metadata: Option<JobMetadataDto>,
}

/// `data` object of a webhook payload.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PriceDataDto {
    /// Price in bolívares (number or numeric string). Required.
    #[serde(default)]
    pub precio_ves: Option<Decimal>,
    /// Upstream update time, RFC 3339. Required.
    #[serde(default)]
    pub fecha_consulta_api: Option<String>,
    /// Rate label. Defaults to `"desconocida"`.
    #[serde(default)]
    pub fuente: Option<String>,
}

/// `job_metadata` object of a webhook payload.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct JobMetadataDto {
    /// Reporting job identifier.
    #[serde(default)]
    pub acurast_job_id: Option<String>,
    /// When the job ran, RFC 3339. Defaults to receive time.
    #[serde(default)]
    pub execution_timestamp: Option<String>,
}

/// Response body for an accepted webhook.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAccepted {
    /// Always `true`.
    pub success: bool,
    /// Id of the inserted price row.
    pub id: i64,
}
