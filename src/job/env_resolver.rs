//! Bounded-retry lookup of environment values.
//!
//! The scheduling platform may start the job before it has finished
//! injecting the environment. [`EnvironmentResolver::resolve`] polls a few
//! times with a fixed delay and gives up with `None` instead of blocking.

use std::collections::HashMap;
use std::time::Duration;

/// Read access to a set of named configuration values.
pub trait EnvSource: Send + Sync {
    /// Returns the raw value for `key`, or `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Polls an [`EnvSource`] for values that may show up late.
#[derive(Debug, Clone)]
pub struct EnvironmentResolver<E> {
    source: E,
}

impl<E: EnvSource> EnvironmentResolver<E> {
    /// Wraps an environment source.
    #[must_use]
    pub const fn new(source: E) -> Self {
        Self { source }
    }

    /// Returns the underlying source.
    #[must_use]
    pub const fn source(&self) -> &E {
        &self.source
    }

    /// Reads `key` once. Empty values count as absent.
    #[must_use]
    pub fn resolve_once(&self, key: &str) -> Option<String> {
        self.source.get(key).filter(|value| !value.is_empty())
    }

    /// Reads `key`, retrying up to `max_retries` attempts with `delay`
    /// between them.
    ///
    /// Returns as soon as an attempt observes a value. There is no sleep
    /// after the last failed attempt. A budget of zero still reads once.
    pub async fn resolve(&self, key: &str, max_retries: u32, delay: Duration) -> Option<String> {
        let attempts = max_retries.max(1);

        for attempt in 1..=attempts {
            if let Some(value) = self.resolve_once(key) {
                if attempt > 1 {
                    tracing::info!(key, attempt, "environment variable became available");
                }
                return Some(value);
            }

            tracing::info!(key, attempt, max_retries = attempts, "waiting for environment variable");
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::warn!(key, attempts, "environment variable never appeared");
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    /// Source where `key` only appears on the `visible_from`-th read.
    #[derive(Debug)]
    struct LateEnv {
        key: &'static str,
        visible_from: u32,
        reads: AtomicU32,
    }

    impl LateEnv {
        fn new(key: &'static str, visible_from: u32) -> Self {
            Self {
                key,
                visible_from,
                reads: AtomicU32::new(0),
            }
        }
    }

    impl EnvSource for LateEnv {
        fn get(&self, key: &str) -> Option<String> {
            if key != self.key {
                return None;
            }
            let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            (read >= self.visible_from).then(|| "https://hooks.test/cb".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn present_value_returns_without_waiting() {
        let resolver = EnvironmentResolver::new(LateEnv::new("CALLBACK_URL", 1));
        let start = Instant::now();

        let value = resolver
            .resolve("CALLBACK_URL", 3, Duration::from_secs(2))
            .await;

        assert_eq!(value.as_deref(), Some("https://hooks.test/cb"));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(resolver.source().reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_value_returns_on_first_observing_attempt() {
        let resolver = EnvironmentResolver::new(LateEnv::new("CALLBACK_URL", 2));
        let start = Instant::now();

        let value = resolver
            .resolve("CALLBACK_URL", 5, Duration::from_secs(2))
            .await;

        assert!(value.is_some());
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(4));
        assert_eq!(resolver.source().reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_value_exhausts_budget_and_returns_none() {
        let resolver = EnvironmentResolver::new(LateEnv::new("CALLBACK_URL", u32::MAX));
        let start = Instant::now();

        let value = resolver
            .resolve("CALLBACK_URL", 3, Duration::from_secs(2))
            .await;

        assert!(value.is_none());
        assert_eq!(resolver.source().reads.load(Ordering::SeqCst), 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(4) && waited < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_string_counts_as_absent() {
        let env = HashMap::from([("JOB_ID".to_string(), String::new())]);
        let resolver = EnvironmentResolver::new(env);

        assert!(resolver.resolve("JOB_ID", 2, Duration::from_millis(10)).await.is_none());
        assert!(resolver.resolve_once("JOB_ID").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_still_reads_once() {
        let env = HashMap::from([("JOB_ID".to_string(), "job-1".to_string())]);
        let resolver = EnvironmentResolver::new(env);

        assert_eq!(
            resolver.resolve("JOB_ID", 0, Duration::from_secs(1)).await.as_deref(),
            Some("job-1")
        );
    }
}
