//! Exporter configuration.

use thiserror::Error;

/// Base URL of the serverless acceptor.
pub const ENDPOINT_URL_ENV: &str = "INSTANA_ENDPOINT_URL";
/// Agent key sent as `x-instana-key`.
pub const AGENT_KEY_ENV: &str = "INSTANA_AGENT_KEY";
/// Diagnostic verbosity: `error`, `warn`, `info` or `debug`.
pub const LOG_LEVEL_ENV: &str = "INSTANA_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("INSTANA_ENDPOINT_URL is not set")]
    MissingEndpoint,
    #[error("INSTANA_AGENT_KEY is not set")]
    MissingAgentKey,
}

/// Verbosity of the exporter's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    #[default]
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Parses a level name case-insensitively; unknown names fall back to `Error`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "warn" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Configuration for [`InstanaExporter`](crate::InstanaExporter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Serverless acceptor base URL, e.g. `https://serverless.instana.io`.
    pub endpoint_url: String,
    /// Agent key. Never logged.
    pub agent_key: String,
    pub log_level: LogLevel,
}

impl ExporterConfig {
    /// Creates a configuration without validating it; an empty endpoint or key
    /// is reported per export call as a configuration error.
    pub fn new(endpoint_url: impl Into<String>, agent_key: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            agent_key: agent_key.into(),
            log_level: LogLevel::default(),
        }
    }

    /// Loads and validates the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint_url = non_empty(ENDPOINT_URL_ENV).ok_or(ConfigError::MissingEndpoint)?;
        let agent_key = non_empty(AGENT_KEY_ENV).ok_or(ConfigError::MissingAgentKey)?;
        let log_level = lookup(LOG_LEVEL_ENV)
            .map(|v| LogLevel::parse(&v))
            .unwrap_or_default();

        Ok(Self {
            endpoint_url,
            agent_key,
            log_level,
        })
    }

    /// Sets the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Checks the values every export needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.agent_key.trim().is_empty() {
            return Err(ConfigError::MissingAgentKey);
        }
        Ok(())
    }

    /// `<endpoint_url without trailing slashes>/bundle`
    pub fn bundle_url(&self) -> String {
        format!("{}/bundle", self.endpoint_url.trim_end_matches('/'))
    }
}
