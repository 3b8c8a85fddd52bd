//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for `GET /prices`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PriceListQuery {
    /// Only return rows reported by this job.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching items.
    pub total: u64,
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// `ceil(total / per_page)`.
    pub total_pages: u64,
}

/// Body for endpoints that only acknowledge receipt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Acknowledged {
    /// Always `true`.
    pub success: bool,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PriceListQuery {
    fn default() -> Self {
        Self {
            job_id: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PriceListQuery {
    /// Clamps `page` to at least 1 and `per_page` to `1..=100`. An empty
    /// `job_id` means no filter.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            job_id: self.job_id.clone().filter(|id| !id.is_empty()),
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Number of rows to skip for the current page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl PaginationMeta {
    /// Builds metadata for `total` items paged by `query`.
    #[must_use]
    pub fn new(total: u64, query: &PriceListQuery) -> Self {
        let per_page = u64::from(query.per_page.max(1));
        Self {
            total,
            page: query.page,
            per_page: query.per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}
