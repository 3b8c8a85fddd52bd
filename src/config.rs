//! Configuration loaded from environment variables.
//!
//! Follows 12-factor style: every setting comes from the environment (or a
//! `.env` file via `dotenvy`). The ingest server reads [`IngestConfig`]; the
//! price job reads [`JobSettings`]. Both are built once in `main` and passed
//! down explicitly.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::job::env_resolver::{EnvSource, ProcessEnv};
use crate::telemetry::LogFormat;

/// Public endpoint serving the official VES/USD rate.
pub const DEFAULT_PRICE_API_URL: &str = "https://ve.dolarapi.com/v1/dolares/oficial";

/// Source label attached to readings when `PRICE_SOURCE` is unset.
pub const DEFAULT_PRICE_SOURCE: &str = "oficial";

/// Ingest server configuration.
///
/// Loaded once at startup via [`IngestConfig::from_env`].
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection options.
    pub database: PgConnectOptions,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// When `false`, records are kept in memory and lost on restart.
    pub persistence_enabled: bool,

    /// Apply the embedded migrations on startup.
    pub run_migrations: bool,

    /// Per-request timeout enforced by the HTTP layer.
    pub request_timeout_secs: u64,

    /// Log output format.
    pub log_format: LogFormat,
}

impl IngestConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. `DATABASE_URL`
    /// wins over the individual `DB_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is malformed, or if `LISTEN_ADDR`
    /// (or `PORT`) is set but cannot be parsed into a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();
        Self::from_source(&ProcessEnv)
    }

    /// Loads configuration from an arbitrary [`EnvSource`].
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address or `DATABASE_URL` cannot be
    /// parsed.
    pub fn from_source(
        env: &impl EnvSource,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let listen_addr: SocketAddr = match env.get("LISTEN_ADDR") {
            Some(addr) => addr.parse()?,
            None => {
                let port = env.get("PORT").unwrap_or_else(|| "3000".to_string());
                format!("0.0.0.0:{port}").parse()?
            }
        };

        let database = match env.get("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url)?,
            None => database_options_from_parts(env),
        };

        Ok(Self {
            listen_addr,
            database,
            database_max_connections: parse_var(env, "DATABASE_MAX_CONNECTIONS", 10),
            database_min_connections: parse_var(env, "DATABASE_MIN_CONNECTIONS", 2),
            database_connect_timeout_secs: parse_var(env, "DATABASE_CONNECT_TIMEOUT_SECS", 5),
            persistence_enabled: parse_var_bool(env, "PERSISTENCE_ENABLED", true),
            run_migrations: parse_var_bool(env, "RUN_MIGRATIONS", true),
            request_timeout_secs: parse_var(env, "REQUEST_TIMEOUT_SECS", 30),
            log_format: parse_var(env, "LOG_FORMAT", LogFormat::Text),
        })
    }
}

/// Builds connection options from `DB_USER`, `DB_PASSWORD`, `DB_HOST`,
/// `DB_PORT` and `DB_NAME`. Values are passed through as-is, never
/// spliced into a URL.
fn database_options_from_parts(env: &impl EnvSource) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .username(&env.get("DB_USER").unwrap_or_else(|| "postgres".to_string()))
        .host(&env.get("DB_HOST").unwrap_or_else(|| "localhost".to_string()))
        .port(parse_var(env, "DB_PORT", 5432))
        .database(&env.get("DB_NAME").unwrap_or_else(|| "dolar_tracker".to_string()));

    match env.get("DB_PASSWORD") {
        Some(password) => options.password(&password),
        None => options,
    }
}

/// Static tuning for one price-job run.
///
/// The per-run values (`CALLBACK_URL`, `JOB_ID`, `DEBUG_URL`) are not here;
/// they go through the retrying resolver and end up in
/// [`crate::job::JobConfig`].
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// URL of the upstream price API.
    pub price_api_url: String,

    /// Label stored as `fuente` on every reading.
    pub price_source: String,

    /// Deadline applied to each outbound HTTP call.
    pub request_timeout: Duration,

    /// Attempts made for each required environment value.
    pub env_max_retries: u32,

    /// Pause between attempts.
    pub env_retry_delay: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            price_source: DEFAULT_PRICE_SOURCE.to_string(),
            request_timeout: Duration::from_millis(10_000),
            env_max_retries: 3,
            env_retry_delay: Duration::from_millis(2_000),
            log_format: LogFormat::Text,
        }
    }
}

impl JobSettings {
    /// Loads job settings from the process environment, reading `.env`
    /// first when present.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_source(&ProcessEnv)
    }

    /// Loads job settings from an arbitrary [`EnvSource`].
    #[must_use]
    pub fn from_source(env: &impl EnvSource) -> Self {
        let defaults = Self::default();
        Self {
            price_api_url: env.get("PRICE_API_URL").unwrap_or(defaults.price_api_url),
            price_source: env.get("PRICE_SOURCE").unwrap_or(defaults.price_source),
            request_timeout: Duration::from_millis(parse_var(env, "JOB_TIMEOUT_MS", 10_000)),
            env_max_retries: parse_var(env, "ENV_MAX_RETRIES", defaults.env_max_retries),
            env_retry_delay: Duration::from_millis(parse_var(env, "ENV_RETRY_DELAY_MS", 2_000)),
            log_format: parse_var(env, "LOG_FORMAT", defaults.log_format),
        }
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<T: FromStr>(env: &impl EnvSource, key: &str, default: T) -> T {
    env.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a variable as a boolean. Accepts `"true"`, `"1"`, `"false"`,
/// `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_var_bool(env: &impl EnvSource, key: &str, default: bool) -> bool {
    match env.get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
