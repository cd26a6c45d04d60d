use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

/// Lowest-precedence layer of every resolved configuration, built from the
/// `Default` of each typed section.
pub fn defaults() -> Value {
    json!({
        "http": HttpSettings::default(),
        "logging": LoggingSettings::default(),
        "test": TestSettings::default(),
        "report": ReportSettings::default(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Seconds.
    pub timeout: f64,
    pub retry_count: u32,
    /// Seconds between attempts. Flat, never grows.
    pub retry_delay: f64,
    pub verify_ssl: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: 30.0,
            retry_count: 0,
            retry_delay: 1.0,
            verify_ssl: true,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        seconds("http.timeout", self.timeout)
    }

    pub fn retry_delay(&self) -> Result<Duration, ConfigError> {
        seconds("http.retry_delay", self.retry_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Level at which the client logs each request and response.
    pub request_level: String,
    /// Characters of body kept in logs and report records.
    pub body_limit: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            request_level: "debug".to_string(),
            body_limit: 2048,
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.level
            .parse::<log::LevelFilter>()
            .map_err(|_| ConfigError::InvalidValue {
                path: "logging.level".to_string(),
                message: format!("unknown log level '{}'", self.level),
            })
    }

    pub fn request_level(&self) -> Result<log::Level, ConfigError> {
        self.request_level
            .parse::<log::Level>()
            .map_err(|_| ConfigError::InvalidValue {
                path: "logging.request_level".to_string(),
                message: format!("unknown log level '{}'", self.request_level),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSettings {
    pub parallel_workers: usize,
    /// Seconds after which a response counts as slow.
    pub slow_threshold: f64,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            parallel_workers: 2,
            slow_threshold: 5.0,
        }
    }
}

impl TestSettings {
    pub fn slow_threshold(&self) -> Result<Duration, ConfigError> {
        seconds("test.slow_threshold", self.slow_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("report/data"),
            enabled: true,
        }
    }
}

/// Deserializes a section, falling back to the type's defaults when the section is absent.
pub(crate) fn from_section<T>(name: &str, section: Option<&Value>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match section {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidValue {
                path: name.to_string(),
                message: e.to_string(),
            })
        }
    }
}

fn seconds(path: &str, value: f64) -> Result<Duration, ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            path: path.to_string(),
            message: format!("expected a non-negative number of seconds, got {value}"),
        });
    }
    Duration::try_from_secs_f64(value).map_err(|e| ConfigError::InvalidValue {
        path: path.to_string(),
        message: format!("{value} seconds is out of range: {e}"),
    })
}
