//! Best-effort failure reporting to the optional debug endpoint.

use std::time::Duration;

use super::WebhookDispatcher;
use crate::domain::DebugEvent;

/// Sends [`DebugEvent`]s and swallows every failure.
///
/// Reporting is awaited inline by the runner; it is never a detached task.
#[derive(Debug, Clone)]
pub struct DiagnosticReporter {
    dispatcher: WebhookDispatcher,
    timeout: Duration,
}

impl DiagnosticReporter {
    /// Creates a reporter whose posts are bounded by `timeout`.
    #[must_use]
    pub const fn new(dispatcher: WebhookDispatcher, timeout: Duration) -> Self {
        Self {
            dispatcher,
            timeout,
        }
    }

    /// Posts `event` to `debug_url`. Failures are logged locally only.
    pub async fn report(&self, debug_url: &str, event: &DebugEvent) {
        let event_type = event.event_type_str();

        match self.dispatcher.deliver(debug_url, event, self.timeout).await {
            Ok(delivery) if delivery.ok => {
                tracing::info!(debug_url, event_type, "diagnostic sent");
            }
            Ok(delivery) => {
                tracing::warn!(
                    debug_url,
                    event_type,
                    status = delivery.status,
                    "debug endpoint rejected diagnostic"
                );
            }
            Err(e) => {
                tracing::warn!(debug_url, event_type, error = %e, "could not send diagnostic");
            }
        }
    }
}
