//! Diagnostic events sent to the optional debug endpoint.
//!
//! These are best-effort side-channel messages. They are never retried and
//! never stored by the job itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification of a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A call exceeded its deadline.
    Timeout,
    /// Upstream answered with a non-2xx status.
    BadStatus,
    /// Upstream body did not have the expected shape.
    InvalidFormat,
    /// Connection-level failure.
    Transport,
    /// Required configuration never appeared.
    ConfigMissing,
}

/// Event posted to `DEBUG_URL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DebugEvent {
    /// The job could not start because its configuration is incomplete.
    JobFailure {
        /// Human-readable description.
        error: String,
        /// Where the failure happened (e.g. `env_propagation_failure`).
        context: String,
        /// When the failure was observed.
        timestamp: DateTime<Utc>,
    },

    /// The job started but a network step failed.
    RuntimeError {
        /// Identifier of the failing job.
        job_id: String,
        /// Human-readable description.
        error: String,
        /// Classification of the failure.
        error_kind: FailureKind,
        /// When the failure was observed.
        timestamp: DateTime<Utc>,
    },
}

impl DebugEvent {
    /// Builds a config-propagation failure event.
    #[must_use]
    pub fn config_failure(error: impl Into<String>) -> Self {
        Self::JobFailure {
            error: error.into(),
            context: "env_propagation_failure".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Builds a runtime failure event.
    #[must_use]
    pub fn runtime_error(job_id: &str, error: impl Into<String>, error_kind: FailureKind) -> Self {
        Self::RuntimeError {
            job_id: job_id.to_string(),
            error: error.into(),
            error_kind,
            timestamp: Utc::now(),
        }
    }

    /// Returns the `event` tag as a string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::JobFailure { .. } => "job_failure",
            Self::RuntimeError { .. } => "runtime_error",
        }
    }
}
