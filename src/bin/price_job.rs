//! One-shot price job.
//!
//! Reads `CALLBACK_URL`, `JOB_ID` and the optional `DEBUG_URL` from the
//! environment, fetches the current price and posts it to the callback.
//! The process exit code reports the outcome: `0` delivered, `1` failed,
//! `2` configuration missing.

use std::process::ExitCode;

use dolar_tracker::config::JobSettings;
use dolar_tracker::job::{JobRunner, ProcessEnv};
use dolar_tracker::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let settings = JobSettings::from_env();
    telemetry::init(settings.log_format);

    let client = reqwest::Client::builder()
        .user_agent(concat!("dolar-tracker/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let outcome = JobRunner::new(ProcessEnv, settings, client).run().await;
    tracing::info!(exit_code = outcome.exit_code(), success = outcome.is_success(), "job finished");

    Ok(ExitCode::from(outcome.exit_code()))
}
