//! In-process store for local runs (`PERSISTENCE_ENABLED=false`) and tests.
//!
//! Uses [`tokio::sync::RwLock`] so reads from the prices endpoint can run
//! concurrently. Data is lost on restart.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PriceStore;
use super::models::{NewPriceLog, NewWebhookDebugLog, PriceLogRecord, WebhookDebugLog};
use crate::error::IngestError;

/// Vectors of rows guarded by async read-write locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    prices: RwLock<Vec<PriceLogRecord>>,
    audit: RwLock<Vec<WebhookDebugLog>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every audit row, oldest first.
    pub async fn audit_entries(&self) -> Vec<WebhookDebugLog> {
        self.audit.read().await.clone()
    }

    /// Returns a copy of every price row, oldest first.
    pub async fn price_records(&self) -> Vec<PriceLogRecord> {
        self.prices.read().await.clone()
    }
}

fn matches_job(record: &PriceLogRecord, job_id: Option<&str>) -> bool {
    job_id.is_none_or(|id| record.acurast_job_id.as_deref() == Some(id))
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn insert_price(&self, record: &NewPriceLog) -> Result<i64, IngestError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = PriceLogRecord {
            id,
            precio_ves: record.precio_ves,
            fecha_consulta_api: record.fecha_consulta_api,
            fuente: record.fuente.clone(),
            acurast_job_id: record.acurast_job_id.clone(),
            execution_timestamp: record.execution_timestamp,
            received_at: Utc::now(),
        };
        self.prices.write().await.push(row);
        Ok(id)
    }

    async fn list_prices(
        &self,
        job_id: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PriceLogRecord>, IngestError> {
        let prices = self.prices.read().await;
        let mut rows: Vec<PriceLogRecord> = prices
            .iter()
            .filter(|r| matches_job(r, job_id))
            .cloned()
            .collect();
        drop(prices);

        rows.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .collect())
    }

    async fn count_prices(&self, job_id: Option<&str>) -> Result<u64, IngestError> {
        let prices = self.prices.read().await;
        Ok(prices.iter().filter(|r| matches_job(r, job_id)).count() as u64)
    }

    async fn record_audit(&self, entry: &NewWebhookDebugLog) -> Result<Uuid, IngestError> {
        let id = Uuid::new_v4();
        self.audit.write().await.push(WebhookDebugLog {
            id,
            payload: entry.payload.clone(),
            source: entry.source.as_str().to_string(),
            error: entry.error.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::persistence::AuditSource;

    fn new_log(job_id: Option<&str>, cents: i64) -> NewPriceLog {
        NewPriceLog {
            precio_ves: Decimal::new(cents, 2),
            fecha_consulta_api: Utc::now(),
            fuente: "oficial".to_string(),
            acurast_job_id: job_id.map(str::to_string),
            execution_timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let store = MemoryStore::new();
        let first = store.insert_price(&new_log(None, 100)).await;
        let second = store.insert_price(&new_log(None, 200)).await;
        assert!(matches!((first, second), (Ok(1), Ok(2))));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filtered() {
        let store = MemoryStore::new();
        for cents in 1..=5 {
            let job = if cents % 2 == 0 { Some("even") } else { Some("odd") };
            let _ = store.insert_price(&new_log(job, cents)).await;
        }

        let Ok(all) = store.list_prices(None, 10, 0).await else {
            panic!("list failed");
        };
        let ids: Vec<i64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);

        let Ok(even) = store.list_prices(Some("even"), 10, 0).await else {
            panic!("list failed");
        };
        assert_eq!(even.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4, 2]);
        assert!(matches!(store.count_prices(Some("odd")).await, Ok(3)));
        assert!(matches!(store.count_prices(Some("none")).await, Ok(0)));
    }

    #[tokio::test]
    async fn offset_past_end_is_empty() {
        let store = MemoryStore::new();
        let _ = store.insert_price(&new_log(None, 100)).await;
        let Ok(rows) = store.list_prices(None, 10, 10).await else {
            panic!("list failed");
        };
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn audit_rows_keep_source_and_error() {
        let store = MemoryStore::new();
        let entry = NewWebhookDebugLog {
            payload: serde_json::json!({ "raw": true }),
            source: AuditSource::Webhook,
            error: Some("missing required fields: event".to_string()),
        };
        let _ = store.record_audit(&entry).await;

        let rows = store.audit_entries().await;
        assert_eq!(rows.len(), 1);
        let Some(row) = rows.first() else {
            panic!("no audit row");
        };
        assert_eq!(row.source, "webhook");
        assert_eq!(row.error.as_deref(), Some("missing required fields: event"));
    }
}
