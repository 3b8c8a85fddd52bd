//! Webhook handlers: price updates and job diagnostics.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{Acknowledged, WebhookAccepted, WebhookRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, IngestError};

/// `POST /webhook`: Record a price reported by a job.
///
/// The body is read raw so that malformed payloads still reach the audit
/// trail.
///
/// # Errors
///
/// Returns [`IngestError`] on an invalid payload or storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/webhook",
    tag = "Webhook",
    summary = "Receive a price update",
    description = "Validates and stores a `dolar_price_update` payload. Every request, valid or not, is written to the audit log.",
    request_body = WebhookRequest,
    responses(
        (status = 200, description = "Price stored", body = WebhookAccepted),
        (status = 400, description = "Missing or malformed fields", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, IngestError> {
    let id = state.ingest_service.ingest_webhook(&body).await?;
    Ok((StatusCode::OK, Json(WebhookAccepted { success: true, id })))
}

/// `POST /webhook/debug`: Record a diagnostic event from a job.
#[utoipa::path(
    post,
    path = "/api/v1/webhook/debug",
    tag = "Webhook",
    summary = "Receive a job diagnostic",
    description = "Logs and audits any body. Always acknowledges.",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Diagnostic recorded", body = Acknowledged),
    )
)]
pub async fn receive_diagnostic(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    state.ingest_service.record_diagnostic(&body).await;
    (StatusCode::OK, Json(Acknowledged { success: true }))
}

/// Webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/webhook/acurast", post(receive_webhook))
        .route("/webhook/debug", post(receive_diagnostic))
}
