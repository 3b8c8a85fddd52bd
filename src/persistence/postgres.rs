//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PriceStore;
use super::models::{NewPriceLog, NewWebhookDebugLog, PriceLogRecord};
use crate::config::IngestConfig;
use crate::error::IngestError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store on top of an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`sqlx::Error`] if no connection can be
    /// established within the configured timeout.
    pub async fn connect(config: &IngestConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_with(config.database.clone())
            .await?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "connected to PostgreSQL"
        );
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`sqlx::migrate::MigrateError`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl PriceStore for PostgresStore {
    async fn insert_price(&self, record: &NewPriceLog) -> Result<i64, IngestError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO dolar_price_logs \
             (precio_ves, fecha_consulta_api, fuente, acurast_job_id, execution_timestamp) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(record.precio_ves)
        .bind(record.fecha_consulta_api)
        .bind(&record.fuente)
        .bind(record.acurast_job_id.as_deref())
        .bind(record.execution_timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_prices(
        &self,
        job_id: Option<&str>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PriceLogRecord>, IngestError> {
        let rows = sqlx::query_as::<_, PriceLogRecord>(
            "SELECT id, precio_ves, fecha_consulta_api, fuente, acurast_job_id, \
             execution_timestamp, received_at \
             FROM dolar_price_logs \
             WHERE ($1::text IS NULL OR acurast_job_id = $1) \
             ORDER BY received_at DESC, id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(job_id)
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_prices(&self, job_id: Option<&str>) -> Result<u64, IngestError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM dolar_price_logs \
             WHERE ($1::text IS NULL OR acurast_job_id = $1)",
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn record_audit(&self, entry: &NewWebhookDebugLog) -> Result<Uuid, IngestError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO webhook_debug_logs (id, payload, source, error) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(&entry.payload)
        .bind(entry.source.as_str())
        .bind(entry.error.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}
