//! Ingest service: validates webhooks, keeps the audit trail, pages reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::api::dto::{PaginationMeta, PriceListQuery, WebhookRequest};
use crate::domain::parse_iso8601;
use crate::error::IngestError;
use crate::persistence::{AuditSource, NewPriceLog, NewWebhookDebugLog, PriceLogRecord, PriceStore};

/// `fuente` stored when a payload omits it.
pub const UNKNOWN_SOURCE: &str = "desconocida";

/// One page of price rows plus its metadata.
#[derive(Debug, Clone)]
pub struct PricePage {
    /// Rows on this page, newest first.
    pub records: Vec<PriceLogRecord>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Orchestration layer for the ingest endpoints.
///
/// Every webhook follows the same pattern: parse → validate → write one
/// audit row → insert → return the id. The audit row is written whether
/// or not the payload is valid.
#[derive(Debug, Clone)]
pub struct IngestService {
    store: Arc<dyn PriceStore>,
}

impl IngestService {
    /// Creates a service on top of a store.
    #[must_use]
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn PriceStore> {
        &self.store
    }

    /// Handles one price webhook body.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidPayload`] when required fields are
    /// missing or malformed, and [`IngestError::Storage`] when the insert
    /// fails. The audit row is written in both cases.
    pub async fn ingest_webhook(&self, body: &[u8]) -> Result<i64, IngestError> {
        let payload = raw_payload(body);
        let validated = validate_payload(&payload, Utc::now());

        let audit = NewWebhookDebugLog {
            payload: payload.clone(),
            source: AuditSource::Webhook,
            error: validated.as_ref().err().map(ToString::to_string),
        };
        self.audit(&audit).await;

        let record = match validated {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "rejected webhook");
                return Err(e);
            }
        };

        match self.store.insert_price(&record).await {
            Ok(id) => {
                tracing::info!(
                    id,
                    price = %record.precio_ves,
                    job_id = record.acurast_job_id.as_deref().unwrap_or("-"),
                    "price recorded"
                );
                Ok(id)
            }
            Err(e) => {
                self.audit(&NewWebhookDebugLog {
                    payload,
                    source: AuditSource::WebhookStorageError,
                    error: Some(e.to_string()),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Handles one diagnostic posted by a job. Always succeeds.
    pub async fn record_diagnostic(&self, body: &[u8]) {
        let payload = raw_payload(body);
        let event = payload.get("event").and_then(Value::as_str).unwrap_or("unknown");
        tracing::info!(event, payload = %payload, "diagnostic received");

        self.audit(&NewWebhookDebugLog {
            payload,
            source: AuditSource::DebugEndpoint,
            error: None,
        })
        .await;
    }

    /// Returns one page of price rows.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Storage`] on backend failure.
    pub async fn list_prices(&self, query: &PriceListQuery) -> Result<PricePage, IngestError> {
        let query = query.clamped();
        let job_id = query.job_id.as_deref();

        let total = self.store.count_prices(job_id).await?;
        let records = self
            .store
            .list_prices(job_id, query.per_page, query.offset())
            .await?;

        Ok(PricePage {
            records,
            pagination: PaginationMeta::new(total, &query),
        })
    }

    /// Writes an audit row; failures are logged, never returned.
    async fn audit(&self, entry: &NewWebhookDebugLog) {
        if let Err(e) = self.store.record_audit(entry).await {
            tracing::error!(source = %entry.source, error = %e, "failed to record audit row");
        }
    }
}

/// Interprets a request body as JSON, falling back to a JSON string.
///
/// NUL characters are dropped from every string and key: `jsonb` rejects
/// them, and the audit row must always be storable.
fn raw_payload(body: &[u8]) -> Value {
    let value = serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
    strip_nul(value)
}

fn strip_nul(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(text.replace('\0', "")),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nul).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key.replace('\0', ""), strip_nul(item)))
                .collect(),
        ),
        other => other,
    }
}

/// Checks a webhook payload and converts it into a row.
///
/// `received_at` fills in a missing `execution_timestamp`.
///
/// # Errors
///
/// Returns [`IngestError::InvalidPayload`] naming every missing required
/// field, or describing the first malformed one. Timestamps may be any
/// form [`parse_iso8601`] accepts.
pub fn validate_payload(
    payload: &Value,
    received_at: DateTime<Utc>,
) -> Result<NewPriceLog, IngestError> {
    if !payload.is_object() {
        return Err(IngestError::InvalidPayload(
            "payload must be a JSON object".to_string(),
        ));
    }

    let request: WebhookRequest = serde_json::from_value(payload.clone())
        .map_err(|e| IngestError::InvalidPayload(e.to_string()))?;

    let event = request.event.filter(|e| !e.is_empty());
    let data = request.data.unwrap_or_default();
    let fecha = data.fecha_consulta_api.filter(|f| !f.is_empty());

    let mut missing = Vec::new();
    if event.is_none() {
        missing.push("event");
    }
    if data.precio_ves.is_none() {
        missing.push("data.precio_ves");
    }
    if fecha.is_none() {
        missing.push("data.fecha_consulta_api");
    }

    let (Some(_), Some(precio_ves), Some(fecha)) = (event, data.precio_ves, fecha) else {
        return Err(IngestError::InvalidPayload(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    };

    if precio_ves <= Decimal::ZERO {
        return Err(IngestError::InvalidPayload(format!(
            "data.precio_ves must be positive, got {precio_ves}"
        )));
    }

    let fecha_consulta_api = parse_timestamp("data.fecha_consulta_api", &fecha)?;

    let metadata = request.job_metadata.unwrap_or_default();
    let execution_timestamp = match metadata.execution_timestamp.filter(|t| !t.is_empty()) {
        Some(ts) => parse_timestamp("job_metadata.execution_timestamp", &ts)?,
        None => received_at,
    };

    Ok(NewPriceLog {
        precio_ves,
        fecha_consulta_api,
        fuente: data
            .fuente
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        acurast_job_id: metadata.acurast_job_id.filter(|id| !id.is_empty()),
        execution_timestamp,
    })
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, IngestError> {
    parse_iso8601(value).ok_or_else(|| {
        IngestError::InvalidPayload(format!("{field} is not an ISO-8601 timestamp: {value:?}"))
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::persistence::MemoryStore;

    fn valid_payload() -> Value {
        json!({
            "event": "dolar_price_update",
            "data": {
                "precio_ves": 36.50,
                "fecha_consulta_api": "2024-05-10T16:00:00.000Z",
                "fuente": "oficial"
            },
            "job_metadata": {
                "acurast_job_id": "job-1",
                "execution_timestamp": "2024-05-10T16:05:00Z"
            }
        })
    }

    fn service() -> (IngestService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = IngestService::new(Arc::clone(&store) as Arc<dyn PriceStore>);
        (service, store)
    }

    /// Accepts audit rows but fails every price insert.
    #[derive(Debug, Default)]
    struct BrokenInserts {
        inner: MemoryStore,
    }

    #[async_trait]
    impl PriceStore for BrokenInserts {
        async fn insert_price(&self, _record: &NewPriceLog) -> Result<i64, IngestError> {
            Err(IngestError::Storage("connection reset by peer".into()))
        }

        async fn list_prices(
            &self,
            _job_id: Option<&str>,
            _limit: u32,
            _offset: u64,
        ) -> Result<Vec<PriceLogRecord>, IngestError> {
            Err(IngestError::Storage("connection reset by peer".into()))
        }

        async fn count_prices(&self, _job_id: Option<&str>) -> Result<u64, IngestError> {
            Err(IngestError::Storage("connection reset by peer".into()))
        }

        async fn record_audit(&self, entry: &NewWebhookDebugLog) -> Result<Uuid, IngestError> {
            self.inner.record_audit(entry).await
        }
    }

    #[test]
    fn valid_payload_becomes_record() {
        let Ok(record) = validate_payload(&valid_payload(), Utc::now()) else {
            panic!("payload should validate");
        };
        assert_eq!(record.precio_ves, Decimal::new(3650, 2));
        assert_eq!(record.fuente, "oficial");
        assert_eq!(record.acurast_job_id.as_deref(), Some("job-1"));
        assert_eq!(record.execution_timestamp.to_rfc3339(), "2024-05-10T16:05:00+00:00");
    }

    #[test]
    fn optional_fields_get_defaults() {
        let received_at = Utc::now();
        let payload = json!({
            "event": "dolar_price_update",
            "data": { "precio_ves": "36.5", "fecha_consulta_api": "2024-05-10T16:00:00Z" }
        });
        let Ok(record) = validate_payload(&payload, received_at) else {
            panic!("payload should validate");
        };
        assert_eq!(record.fuente, UNKNOWN_SOURCE);
        assert!(record.acurast_job_id.is_none());
        assert_eq!(record.execution_timestamp, received_at);
    }

    #[test]
    fn every_missing_field_is_named() {
        let result = validate_payload(&json!({ "data": {} }), Utc::now());
        let Err(IngestError::InvalidPayload(message)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(
            message,
            "missing required fields: event, data.precio_ves, data.fecha_consulta_api"
        );
    }

    #[test]
    fn iso8601_without_offset_is_read_as_utc() {
        for (fecha, expected) in [
            ("2024-05-10T16:00:00", "2024-05-10T16:00:00+00:00"),
            ("2024-05-10 16:00:00", "2024-05-10T16:00:00+00:00"),
            ("2024-05-10 16:00:00Z", "2024-05-10T16:00:00+00:00"),
            ("2024-05-10", "2024-05-10T00:00:00+00:00"),
        ] {
            let mut payload = valid_payload();
            payload["data"]["fecha_consulta_api"] = json!(fecha);
            payload["job_metadata"]["execution_timestamp"] = json!(fecha);
            let Ok(record) = validate_payload(&payload, Utc::now()) else {
                panic!("{fecha} should validate");
            };
            assert_eq!(record.fecha_consulta_api.to_rfc3339(), expected);
            assert_eq!(record.execution_timestamp.to_rfc3339(), expected);
        }
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut bad_date = valid_payload();
        bad_date["data"]["fecha_consulta_api"] = json!("yesterday");
        assert!(validate_payload(&bad_date, Utc::now()).is_err());

        let mut negative = valid_payload();
        negative["data"]["precio_ves"] = json!(-1);
        assert!(validate_payload(&negative, Utc::now()).is_err());

        let mut wrong_type = valid_payload();
        wrong_type["data"]["precio_ves"] = json!(true);
        assert!(validate_payload(&wrong_type, Utc::now()).is_err());

        assert!(validate_payload(&json!([1, 2, 3]), Utc::now()).is_err());
    }

    #[tokio::test]
    async fn webhook_round_trip_stores_one_row() {
        let (service, store) = service();
        let body = valid_payload().to_string();

        let Ok(id) = service.ingest_webhook(body.as_bytes()).await else {
            panic!("webhook should be accepted");
        };

        let rows = store.price_records().await;
        assert_eq!(rows.len(), 1);
        let Some(row) = rows.first() else {
            panic!("no row stored");
        };
        assert_eq!(row.id, id);
        assert_eq!(row.precio_ves, Decimal::new(3650, 2));
        assert_eq!(row.fuente, "oficial");
        assert_eq!(row.acurast_job_id.as_deref(), Some("job-1"));
        assert_eq!(store.audit_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_webhook_is_audited_once() {
        let (service, store) = service();
        let mut payload = valid_payload();
        if let Some(data) = payload["data"].as_object_mut() {
            data.remove("precio_ves");
        }

        let result = service.ingest_webhook(payload.to_string().as_bytes()).await;
        assert!(matches!(result, Err(IngestError::InvalidPayload(_))));

        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        let Some(entry) = audit.first() else {
            panic!("no audit row");
        };
        assert_eq!(entry.payload, payload);
        assert_eq!(entry.source, "webhook");
        assert!(entry.error.as_deref().is_some_and(|e| e.contains("data.precio_ves")));
        assert!(store.price_records().await.is_empty());
    }

    #[tokio::test]
    async fn nul_characters_never_reach_the_audit_row() {
        let (service, store) = service();

        let body = br#"{"event":"x\u0000y","data":{"fuente\u0000":["\u0000"]}}"#;
        let _ = service.ingest_webhook(body).await;
        let _ = service.ingest_webhook(b"raw\0body").await;
        service.record_diagnostic(br#"{"error":"\u0000"}"#).await;

        let audit = store.audit_entries().await;
        let payloads: Vec<Value> = audit.iter().map(|a| a.payload.clone()).collect();
        assert_eq!(
            payloads,
            vec![
                json!({ "event": "xy", "data": { "fuente": [""] } }),
                json!("rawbody"),
                json!({ "error": "" }),
            ]
        );
    }

    #[tokio::test]
    async fn non_json_body_is_audited_as_string() {
        let (service, store) = service();

        let result = service.ingest_webhook(b"precio=36.5").await;
        assert!(matches!(result, Err(IngestError::InvalidPayload(_))));

        let audit = store.audit_entries().await;
        assert_eq!(audit.first().map(|a| a.payload.clone()), Some(json!("precio=36.5")));
    }

    #[tokio::test]
    async fn storage_failure_keeps_audit_trail() {
        let store = Arc::new(BrokenInserts::default());
        let service = IngestService::new(Arc::clone(&store) as Arc<dyn PriceStore>);

        let result = service
            .ingest_webhook(valid_payload().to_string().as_bytes())
            .await;
        assert!(matches!(result, Err(IngestError::Storage(_))));

        let audit = store.inner.audit_entries().await;
        let sources: Vec<&str> = audit.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, vec!["webhook", "webhook_storage_error"]);
    }

    #[tokio::test]
    async fn diagnostics_are_audited() {
        let (service, store) = service();
        service
            .record_diagnostic(br#"{"event":"runtime_error","job_id":"job-1"}"#)
            .await;

        let audit = store.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit.first().map(|a| a.source.clone()), Some("debug_endpoint".to_string()));
    }

    #[tokio::test]
    async fn second_page_of_twenty_five() {
        let (service, _store) = service();
        for i in 1..=25 {
            let mut payload = valid_payload();
            payload["data"]["precio_ves"] = json!(i);
            let _ = service.ingest_webhook(payload.to_string().as_bytes()).await;
        }

        let query = PriceListQuery {
            job_id: None,
            page: 2,
            per_page: 10,
        };
        let Ok(page) = service.list_prices(&query).await else {
            panic!("list should succeed");
        };

        let ids: Vec<i64> = page.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, (6..=15).rev().collect::<Vec<_>>());
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.per_page, 10);
    }

    #[tokio::test]
    async fn listing_filters_by_job() {
        let (service, _store) = service();
        for job in ["a", "b", "a"] {
            let mut payload = valid_payload();
            payload["job_metadata"]["acurast_job_id"] = json!(job);
            let _ = service.ingest_webhook(payload.to_string().as_bytes()).await;
        }

        let query = PriceListQuery {
            job_id: Some("a".to_string()),
            ..PriceListQuery::default()
        };
        let Ok(page) = service.list_prices(&query).await else {
            panic!("list should succeed");
        };
        assert_eq!(page.pagination.total, 2);
        assert!(page.records.iter().all(|r| r.acurast_job_id.as_deref() == Some("a")));
    }

    #[tokio::test]
    async fn listing_storage_failure_is_storage_error() {
        let service = IngestService::new(Arc::new(BrokenInserts::default()));
        let result = service.list_prices(&PriceListQuery::default()).await;
        assert!(matches!(result, Err(IngestError::Storage(_))));
    }
}
