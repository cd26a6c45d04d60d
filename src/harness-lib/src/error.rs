use std::path::PathBuf;
use thiserror::Error;

/// Missing or malformed configuration. Fatal for a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write configuration file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Configuration file {} must contain a mapping at its root", .0.display())]
    NotAMapping(PathBuf),
    #[error("Failed to read .env file {}: {message}", path.display())]
    DotEnv { path: PathBuf, message: String },
    #[error("Missing required keys in section '{section}': {}", keys.join(", "))]
    MissingKeys { section: String, keys: Vec<String> },
    #[error("Invalid configuration value at '{path}': {message}")]
    InvalidValue { path: String, message: String },
    #[error("No base URL configured for service '{0}' (expected http.{0} or http.default)")]
    MissingBaseUrl(String),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Auth error: unknown auth type '{kind}' for service '{service}'")]
    UnknownScheme { service: String, kind: String },
    #[error("Auth error: invalid auth configuration for service '{service}': {message}")]
    InvalidSpec { service: String, message: String },
    #[error("Auth error: login for service '{service}' failed: {message}")]
    LoginFailed { service: String, message: String },
    #[error("Auth error: login response for service '{service}' has no token at '{path}'")]
    TokenMissing { service: String, path: String },
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },
    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },
    #[error("HTTP request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl TransportError {
    /// Timeouts and connection failures are worth another attempt; anything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::Connect { .. }
        )
    }
}

#[derive(Debug, Clone, Error)]
#[error("Hook '{hook}' failed during {stage}: {message}")]
pub struct HookError {
    pub hook: String,
    pub stage: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{source} (after {attempts} attempt(s))")]
    Transport {
        #[source]
        source: TransportError,
        attempts: u32,
    },
    #[error(transparent)]
    Hook(#[from] HookError),
}

/// Every failed rule of one assertion call, reported together.
#[derive(Debug, Clone, Error)]
#[error("{} validation rule(s) failed:\n  {}", failures.len(), failures.join("\n  "))]
pub struct ValidationFailure {
    pub failures: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize report record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Case path not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read case file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse case file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
