//! One pass of the price job: resolve config, fetch, deliver.
//!
//! [`JobRunner::run`] never panics and never returns an error. Every path
//! ends in a [`JobOutcome`]; the next scheduled invocation is the retry.

use chrono::Utc;
use reqwest::Url;

use super::{
    DiagnosticReporter, EnvSource, EnvironmentResolver, JobError, PriceFetcher, WebhookDispatcher,
};
use crate::config::JobSettings;
use crate::domain::{DebugEvent, JobPayload, PriceReading};

/// Required: where to deliver the payload.
pub const CALLBACK_URL_VAR: &str = "CALLBACK_URL";
/// Required: identifier stamped on the payload.
pub const JOB_ID_VAR: &str = "JOB_ID";
/// Optional: where to send diagnostics.
pub const DEBUG_URL_VAR: &str = "DEBUG_URL";

/// Per-run configuration, resolved once and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Receiver of the price payload.
    pub callback_url: Url,
    /// Identifier of this scheduled job.
    pub job_id: String,
    /// Optional diagnostic side channel.
    pub debug_url: Option<Url>,
}

impl JobConfig {
    /// Validates resolved values.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::ConfigMissing`] naming every absent required
    /// variable, or [`JobError::ConfigInvalid`] when `CALLBACK_URL` does not
    /// parse.
    pub fn from_parts(
        callback_url: Option<String>,
        job_id: Option<String>,
        debug_url: Option<Url>,
    ) -> Result<Self, JobError> {
        let (callback_url, job_id) = match (callback_url, job_id) {
            (Some(callback_url), Some(job_id)) => (callback_url, job_id),
            (callback_url, job_id) => {
                let mut missing = Vec::new();
                if callback_url.is_none() {
                    missing.push(CALLBACK_URL_VAR.to_string());
                }
                if job_id.is_none() {
                    missing.push(JOB_ID_VAR.to_string());
                }
                return Err(JobError::ConfigMissing(missing));
            }
        };

        let callback_url = Url::parse(&callback_url).map_err(|e| JobError::ConfigInvalid {
            key: CALLBACK_URL_VAR.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            callback_url,
            job_id,
            debug_url,
        })
    }
}

/// Step the job was in when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    /// Reading environment values.
    ResolvingConfig,
    /// Calling the price API.
    FetchingPrice,
    /// Posting to the callback URL.
    Delivering,
}

/// Terminal state of one run.
#[derive(Debug)]
pub enum JobOutcome {
    /// The callback accepted the payload.
    Succeeded {
        /// Job identifier.
        job_id: String,
        /// The delivered reading.
        reading: PriceReading,
        /// Callback status code.
        status: u16,
    },

    /// Required configuration was unavailable.
    ConfigFailed {
        /// Why resolution failed.
        error: JobError,
    },

    /// A network step failed.
    Failed {
        /// Job identifier.
        job_id: String,
        /// Where it failed.
        stage: JobStage,
        /// What went wrong.
        error: JobError,
    },
}

impl JobOutcome {
    /// Process exit code for this outcome: 0, 1 (failed) or 2 (config).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Succeeded { .. } => 0,
            Self::Failed { .. } => 1,
            Self::ConfigFailed { .. } => 2,
        }
    }

    /// Returns `true` for [`JobOutcome::Succeeded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Orchestrates resolver, fetcher, dispatcher and reporter.
#[derive(Debug)]
pub struct JobRunner<E> {
    resolver: EnvironmentResolver<E>,
    settings: JobSettings,
    fetcher: PriceFetcher,
    dispatcher: WebhookDispatcher,
    reporter: DiagnosticReporter,
}

impl<E: EnvSource> JobRunner<E> {
    /// Wires the pipeline around one shared HTTP client.
    #[must_use]
    pub fn new(env: E, settings: JobSettings, client: reqwest::Client) -> Self {
        let dispatcher = WebhookDispatcher::new(client.clone());
        Self {
            resolver: EnvironmentResolver::new(env),
            fetcher: PriceFetcher::new(client, settings.price_source.clone()),
            reporter: DiagnosticReporter::new(dispatcher.clone(), settings.request_timeout),
            dispatcher,
            settings,
        }
    }

    /// Executes one run.
    pub async fn run(&self) -> JobOutcome {
        let config = match self.resolve_config().await {
            Ok(config) => config,
            Err((error, debug_url)) => return self.config_failed(error, debug_url.as_ref()).await,
        };

        let job_id = config.job_id.as_str();
        tracing::info!(job_id, api_url = %self.settings.price_api_url, "starting price job");

        let reading = match self
            .fetcher
            .fetch_price(&self.settings.price_api_url, self.settings.request_timeout)
            .await
        {
            Ok(reading) => reading,
            Err(error) => return self.failed(&config, JobStage::FetchingPrice, error).await,
        };

        let payload = JobPayload::price_update(reading, job_id, Utc::now());
        let delivery = match self
            .dispatcher
            .deliver(config.callback_url.as_str(), &payload, self.settings.request_timeout)
            .await
        {
            Ok(delivery) => delivery,
            Err(error) => return self.failed(&config, JobStage::Delivering, error).await,
        };

        if delivery.ok {
            tracing::info!(job_id, status = delivery.status, price = %payload.data.precio_ves, "price delivered");
            JobOutcome::Succeeded {
                job_id: config.job_id,
                reading: payload.data,
                status: delivery.status,
            }
        } else {
            // Rejected deliveries are logged only; the debug channel is for
            // config and transport failures.
            tracing::error!(job_id, status = delivery.status, "callback rejected payload");
            JobOutcome::Failed {
                job_id: config.job_id,
                stage: JobStage::Delivering,
                error: JobError::BadStatus(delivery.status),
            }
        }
    }

    /// Resolves required values with retry and `DEBUG_URL` once.
    ///
    /// On failure the debug URL (if any) is handed back so the caller can
    /// still report.
    async fn resolve_config(&self) -> Result<JobConfig, (JobError, Option<Url>)> {
        let retries = self.settings.env_max_retries;
        let delay = self.settings.env_retry_delay;

        let callback_url = self.resolver.resolve(CALLBACK_URL_VAR, retries, delay).await;
        let job_id = self.resolver.resolve(JOB_ID_VAR, retries, delay).await;
        let debug_url = self.resolve_debug_url();

        JobConfig::from_parts(callback_url, job_id, debug_url.clone()).map_err(|e| (e, debug_url))
    }

    fn resolve_debug_url(&self) -> Option<Url> {
        let raw = self.resolver.resolve_once(DEBUG_URL_VAR)?;
        match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unparsable DEBUG_URL");
                None
            }
        }
    }

    async fn config_failed(&self, error: JobError, debug_url: Option<&Url>) -> JobOutcome {
        tracing::error!(
            stage = ?JobStage::ResolvingConfig,
            error = %error,
            debug_configured = debug_url.is_some(),
            "job configuration unavailable"
        );

        if let Some(url) = debug_url {
            let event = DebugEvent::config_failure(error.to_string());
            self.reporter.report(url.as_str(), &event).await;
        }

        JobOutcome::ConfigFailed { error }
    }

    async fn failed(&self, config: &JobConfig, stage: JobStage, error: JobError) -> JobOutcome {
        tracing::error!(
            job_id = %config.job_id,
            ?stage,
            kind = ?error.kind(),
            error = %error,
            "price job failed"
        );

        if let Some(url) = &config.debug_url {
            let event = DebugEvent::runtime_error(&config.job_id, error.to_string(), error.kind());
            self.reporter.report(url.as_str(), &event).await;
        }

        JobOutcome::Failed {
            job_id: config.job_id.clone(),
            stage,
            error,
        }
    }
}
