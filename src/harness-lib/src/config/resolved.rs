use super::settings::{
    from_section, HttpSettings, LoggingSettings, ReportSettings, TestSettings,
};
use crate::error::ConfigError;
use serde_json::Value;
use std::path::Path;

/// Final merged configuration tree. Immutable once resolved; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    environment: String,
    tree: Value,
}

impl ResolvedConfig {
    pub fn new(environment: impl Into<String>, tree: Value) -> Self {
        Self {
            environment: environment.into(),
            tree,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Looks up a dotted path. Numeric segments index into sequences
    /// (`common.username.0`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.tree;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.tree.get(name)
    }

    /// Fails when any of `keys` is missing from `section`.
    pub fn require(&self, section: &str, keys: &[&str]) -> Result<(), ConfigError> {
        let present = self.section(section).and_then(Value::as_object);
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| !present.is_some_and(|map| map.contains_key(**key)))
            .map(|key| key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys {
                section: section.to_string(),
                keys: missing,
            })
        }
    }

    /// `http.<service>` when it is a string, otherwise `http.default`.
    pub fn service_base_url(&self, service: &str) -> Result<&str, ConfigError> {
        self.section("http")
            .and_then(|http| http.get(service))
            .and_then(Value::as_str)
            .or_else(|| self.get_str("http.default"))
            .ok_or_else(|| ConfigError::MissingBaseUrl(service.to_string()))
    }

    pub fn http_settings(&self) -> Result<HttpSettings, ConfigError> {
        from_section("http", self.section("http"))
    }

    pub fn logging_settings(&self) -> Result<LoggingSettings, ConfigError> {
        from_section("logging", self.section("logging"))
    }

    pub fn test_settings(&self) -> Result<TestSettings, ConfigError> {
        from_section("test", self.section("test"))
    }

    pub fn report_settings(&self) -> Result<ReportSettings, ConfigError> {
        from_section("report", self.section("report"))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(&self.tree)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
