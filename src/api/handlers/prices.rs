//! Price history handler.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PriceListQuery, PriceListResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, IngestError};

/// `GET /prices`: List stored prices, newest first.
///
/// # Errors
///
/// Returns [`IngestError::InvalidQuery`] for unparsable parameters and
/// [`IngestError::Storage`] on backend failure.
#[utoipa::path(
    get,
    path = "/api/v1/prices",
    tag = "Prices",
    summary = "List prices",
    description = "Returns a paginated list of stored prices ordered by receive time, newest first, optionally filtered by job id.",
    params(PriceListQuery),
    responses(
        (status = 200, description = "Paginated price list", body = PriceListResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_prices(
    State(state): State<AppState>,
    query: Result<Query<PriceListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, IngestError> {
    let Query(query) = query.map_err(|e| IngestError::InvalidQuery(e.body_text()))?;
    let page = state.ingest_service.list_prices(&query).await?;

    let response = PriceListResponse {
        success: true,
        data: page.records,
        pagination: page.pagination,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Price routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/prices", get(list_prices))
}
