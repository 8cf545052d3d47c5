//! errwatch.toml configuration parser.
//!
//! Non-secret settings come from the TOML file; the session cookie and
//! the webhook endpoint path come from the environment. Validation runs
//! at load time and is fatal: the scheduler relies on `interval_secs > 0`
//! as a precondition and never re-checks it.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the session cookie secret.
pub const COOKIE_ENV: &str = "ERRWATCH_COOKIE";
/// Environment variable holding the webhook endpoint path.
pub const WEBHOOK_ENDPOINT_ENV: &str = "ERRWATCH_WEBHOOK_ENDPOINT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Session cookie secret, from `ERRWATCH_COOKIE`.
    #[serde(skip)]
    pub cookie: String,
}

/// The cluster being watched.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Base URL prefix, e.g. `https://`.
    pub host: String,
    /// Cluster address segments appended to the host. May be empty, in
    /// which case every check is a no-op.
    #[serde(default)]
    pub clusters: Vec<String>,
    /// Tick interval for every check kind, in seconds. Must be > 0.
    pub interval_secs: u64,
    /// Value of the `X-User-Id` header.
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

/// Where failure notifications go.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub base_url: String,
    /// Mention target included in alert payloads.
    #[serde(default = "default_mention")]
    pub mention: String,
    /// Endpoint path, from `ERRWATCH_WEBHOOK_ENDPOINT`.
    #[serde(skip)]
    pub endpoint: String,
}

/// Outbound HTTP tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for one probe, in seconds.
    pub probe_timeout_secs: u64,
    /// Deadline for one whole check invocation (all hosts), in seconds.
    /// Independent of the tick interval.
    pub invocation_timeout_secs: u64,
    /// Maximum response body bytes read per probe; longer bodies are
    /// truncated.
    pub body_cap_bytes: usize,
    /// Accept invalid TLS certificates. Off by default; enabling it is
    /// logged as a security risk.
    pub insecure_skip_verify: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 30,
            invocation_timeout_secs: 60,
            body_cap_bytes: 64 * 1024,
            insecure_skip_verify: false,
        }
    }
}

fn default_user_id() -> String {
    "51523448".to_string()
}

fn default_mention() -> String {
    "@kadymov.murad".to_string()
}

impl Config {
    /// Parse TOML content. Environment-sourced fields stay empty; callers
    /// go through [`Config::load`] for the full picture.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a file, fill secrets from the environment, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.cookie =
            std::env::var(COOKIE_ENV).map_err(|_| ConfigError::MissingEnv(COOKIE_ENV))?;
        config.webhook.endpoint = std::env::var(WEBHOOK_ENDPOINT_ENV)
            .map_err(|_| ConfigError::MissingEnv(WEBHOOK_ENDPOINT_ENV))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate scheduler preconditions. Fatal on failure: the process
    /// must not start the scheduler with an invalid config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "target.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.target.host.is_empty() {
            return Err(ConfigError::Invalid(
                "target.host must not be empty".to_string(),
            ));
        }
        if self.webhook.base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "webhook.base_url must not be empty".to_string(),
            ));
        }
        if self.cookie.is_empty() {
            return Err(ConfigError::Invalid(
                "cookie secret must not be empty".to_string(),
            ));
        }
        if self.http.probe_timeout_secs == 0 || self.http.invocation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "http timeouts must be greater than zero".to_string(),
            ));
        }
        if self.http.body_cap_bytes == 0 {
            return Err(ConfigError::Invalid(
                "http.body_cap_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
