//! Per-request step records, written as one JSON file each into the report directory.

use crate::client::{RequestRecord, ResponseRecord};
use crate::error::ReportError;
use crate::hooks::{Hook, HookResult};
use crate::http::{truncate_body, HttpMethod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MASK: &str = "***";
const SENSITIVE_HEADER_PARTS: &[&str] = &[
    "authorization",
    "cookie",
    "token",
    "secret",
    "password",
    "api-key",
    "apikey",
];
const SENSITIVE_KEY_PARTS: &[&str] = &["password", "token", "secret", "key"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: String,
    pub case: Option<String>,
    pub service: String,
    pub method: HttpMethod,
    pub url: String,
    pub status: u16,
    pub duration_ms: u64,
    pub attempts: u32,
    pub request_headers: BTreeMap<String, String>,
    pub request_body: Option<String>,
    pub response_body: String,
    pub started_at: DateTime<Utc>,
}

impl StepRecord {
    /// Builds a record with sensitive request headers and JSON body fields masked
    /// and bodies cut to `body_limit` characters.
    pub fn from_exchange(
        request: &RequestRecord,
        response: &ResponseRecord,
        body_limit: usize,
    ) -> Self {
        let request_headers = request
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if is_sensitive(name) { MASK } else { value };
                (name.to_string(), shown.to_string())
            })
            .collect();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            case: response.label.clone(),
            service: response.service.clone(),
            method: response.method,
            url: response.url.clone(),
            status: response.status,
            duration_ms: u64::try_from(response.elapsed.as_millis()).unwrap_or(u64::MAX),
            attempts: response.attempts,
            request_headers,
            request_body: request
                .body
                .as_deref()
                .map(|body| truncate_body(&mask_body(body), body_limit)),
            response_body: truncate_body(&response.body, body_limit),
            started_at: response.started_at,
        }
    }
}

fn is_sensitive(header: &str) -> bool {
    let lower = header.to_ascii_lowercase();
    SENSITIVE_HEADER_PARTS.iter().any(|part| lower.contains(part))
}

/// Copy of `value` with every scalar under a sensitive key (one containing
/// `password`, `token`, `secret` or `key`, any case) replaced by `***`.
pub fn mask_secrets(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(name, item)| {
                    let masked = if is_sensitive_key(name) {
                        mask_all(item)
                    } else {
                        mask_secrets(item)
                    };
                    (name.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_secrets).collect()),
        other => other.clone(),
    }
}

fn mask_all(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(name, item)| (name.clone(), mask_all(item)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_all).collect()),
        _ => Value::String(MASK.to_string()),
    }
}

fn is_sensitive_key(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_KEY_PARTS.iter().any(|part| lower.contains(part))
}

/// JSON bodies come back re-serialized with secrets masked; anything else is kept.
fn mask_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => {
            serde_json::to_string(&mask_secrets(&value)).unwrap_or_else(|_| body.to_string())
        }
        _ => body.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `<id>-step.json`, creating the directory when needed.
    pub fn write(&self, record: &StepRecord) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ReportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(format!("{}-step.json", record.id));
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Writes a [`StepRecord`] after every request.
pub struct ReportHook {
    writer: ReportWriter,
    body_limit: usize,
}

impl ReportHook {
    pub fn new(writer: ReportWriter, body_limit: usize) -> Self {
        Self { writer, body_limit }
    }
}

impl Hook for ReportHook {
    fn name(&self) -> &str {
        "report"
    }

    fn after_request(&self, request: &RequestRecord, response: &ResponseRecord) -> HookResult {
        let record = StepRecord::from_exchange(request, response, self.body_limit);
        let path = self.writer.write(&record)?;
        log::trace!("Wrote step record {}", path.display());
        Ok(())
    }
}
