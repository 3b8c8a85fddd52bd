//! Failure taxonomy for one job execution.

use std::time::Duration;

use crate::domain::FailureKind;

/// Every way a job run can fail.
///
/// All variants are terminal for the run: nothing is retried past the
/// environment resolver's bounded wait.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Required environment values were not present after all retries.
    #[error("missing required configuration: {}", .0.join(", "))]
    ConfigMissing(Vec<String>),

    /// A configuration value was present but unusable.
    #[error("invalid configuration {key}: {reason}")]
    ConfigInvalid {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A network call exceeded its deadline.
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Upstream answered with a non-2xx status.
    #[error("upstream responded with status {0}")]
    BadStatus(u16),

    /// Upstream body did not contain the expected fields.
    #[error("unexpected response format: {0}")]
    InvalidFormat(String),

    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("transport error: {0}")]
    Transport(String),
}

impl JobError {
    /// Classifies the error for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::ConfigMissing(_) | Self::ConfigInvalid { .. } => FailureKind::ConfigMissing,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::BadStatus(_) => FailureKind::BadStatus,
            Self::InvalidFormat(_) => FailureKind::InvalidFormat,
            Self::Transport(_) => FailureKind::Transport,
        }
    }

    /// Returns `true` for deadline failures.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for JobError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidFormat(e.to_string())
        } else if let Some(status) = e.status() {
            Self::BadStatus(status.as_u16())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
