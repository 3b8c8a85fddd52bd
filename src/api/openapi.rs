//! OpenAPI document and its serving route.
//!
//! With the `swagger-ui` feature the document is served alongside an
//! interactive UI at `/swagger-ui`; without it only the JSON is served.

use axum::Router;
use utoipa::OpenApi;

use crate::api::dto::{
    Acknowledged, JobMetadataDto, PaginationMeta, PriceDataDto, PriceListResponse,
    WebhookAccepted, WebhookRequest,
};
use crate::api::handlers::system::HealthResponse;
use crate::app_state::AppState;
use crate::error::{ErrorBody, ErrorResponse};
use crate::persistence::PriceLogRecord;

/// Path of the generated OpenAPI JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Aggregated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "dolar-tracker",
        description = "Webhook ingest and price history for the VES/USD price job."
    ),
    paths(
        crate::api::handlers::webhook::receive_webhook,
        crate::api::handlers::webhook::receive_diagnostic,
        crate::api::handlers::prices::list_prices,
        crate::api::handlers::system::health_handler,
    ),
    components(schemas(
        WebhookRequest,
        PriceDataDto,
        JobMetadataDto,
        WebhookAccepted,
        Acknowledged,
        PriceListResponse,
        PriceLogRecord,
        PaginationMeta,
        HealthResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Webhook", description = "Price and diagnostic intake"),
        (name = "Prices", description = "Stored price history"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Documentation routes.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

/// Documentation routes.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
