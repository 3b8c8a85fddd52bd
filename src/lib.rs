//! # dolar-tracker
//!
//! Scheduled VES/USD price job and the ingest API that receives its reports.
//!
//! The job resolves its callback settings from the environment, fetches the
//! current price, and posts it as a webhook. Failures that happen after the
//! callback is known are reported to an optional diagnostic URL. The ingest
//! API validates each webhook, audits it, stores accepted prices in an
//! append-only log, and serves them back page by page.
//!
//! ## Architecture
//!
//! ```text
//! price-job (bin)                        dolar-tracker (bin)
//!     │                                      │
//!     ├── JobRunner (job/)                   ├── REST Handlers (api/)
//!     │     ├── EnvironmentResolver          │
//!     │     ├── PriceFetcher ── price API    ├── IngestService (service/)
//!     │     ├── WebhookDispatcher ──POST──▶  │
//!     │     └── DiagnosticReporter ─POST──▶  └── PriceStore (persistence/)
//!     │                                            ├── PostgresStore
//!     └── telemetry, config                        └── MemoryStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod job;
pub mod persistence;
pub mod service;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
