//! Price listing DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::persistence::PriceLogRecord;

/// Response body for `GET /prices`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriceListResponse {
    /// Always `true`.
    pub success: bool,
    /// Rows on this page, newest first.
    pub data: Vec<PriceLogRecord>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
