//! Persistence layer: append-only price log and webhook audit trail.
//!
//! [`PriceStore`] abstracts the storage backend. [`PostgresStore`] is the
//! production implementation on top of `sqlx::PgPool`; [`MemoryStore`]
//! keeps everything in process for local runs and tests.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{AuditSource, NewPriceLog, NewWebhookDebugLog, PriceLogRecord, WebhookDebugLog};
pub use postgres::PostgresStore;

use crate::error::IngestError;

/// Storage operations needed by the ingest API.
///
/// Rows are only ever inserted; nothing here updates or deletes.
#[async_trait]
pub trait PriceStore: Send + Sync + std::fmt::Debug {
    /// Inserts one price row and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Storage`] on backend failure.
    async fn insert_price(&self, record: &NewPriceLog) -> Result<i64, IngestError>;

    /// Returns up to `limit` rows after skipping `offset`, newest
    /// `received_at` first (ties by id, newest first), optionally only
    /// those reported by `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Storage`] on backend failure.
    async fn list_prices(
        &self,
        job_id: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PriceLogRecord>, IngestError>;

    /// Counts rows, optionally only those reported by `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Storage`] on backend failure.
    async fn count_prices(&self, job_id: Option<&str>) -> Result<u64, IngestError>;

    /// Appends one audit row and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Storage`] on backend failure.
    async fn record_audit(&self, entry: &NewWebhookDebugLog) -> Result<Uuid, IngestError>;
}
