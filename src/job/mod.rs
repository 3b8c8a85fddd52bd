//! The scheduled price job.
//!
//! ```text
//! JobRunner
//!     ├── EnvironmentResolver  (CALLBACK_URL, JOB_ID with retry; DEBUG_URL once)
//!     ├── PriceFetcher         (GET price API under a deadline)
//!     ├── WebhookDispatcher    (POST JobPayload to CALLBACK_URL)
//!     └── DiagnosticReporter   (best-effort POST DebugEvent to DEBUG_URL)
//! ```
//!
//! Steps run strictly in sequence; at most one request is in flight.

pub mod diagnostic_reporter;
pub mod env_resolver;
pub mod error;
pub mod price_fetcher;
pub mod runner;
pub mod webhook_dispatcher;

pub use diagnostic_reporter::DiagnosticReporter;
pub use env_resolver::{EnvSource, EnvironmentResolver, ProcessEnv};
pub use error::JobError;
pub use price_fetcher::PriceFetcher;
pub use runner::{JobConfig, JobOutcome, JobRunner, JobStage};
pub use webhook_dispatcher::{DeliveryResult, WebhookDispatcher};
