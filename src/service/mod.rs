//! Service layer: business logic orchestration.
//!
//! [`IngestService`] validates webhook payloads, keeps the audit trail and
//! pages stored prices, delegating storage to a [`crate::persistence::PriceStore`].

pub mod ingest_service;

pub use ingest_service::{IngestService, PricePage};
