use crate::error::ConfigError;
use serde_json::Value;
use std::path::Path;

/// Lower-cased prefix of every override variable: `API_TEST__HTTP__TIMEOUT` → `http.timeout`.
pub const ENV_PREFIX: &str = "api_test__";
const SEGMENT_SEPARATOR: &str = "__";

/// One leaf override taken from an environment variable.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvOverride {
    pub key: String,
    pub path: Vec<String>,
    pub value: Value,
    /// The variable's text before JSON parsing.
    pub raw: String,
}

impl EnvOverride {
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    /// The value to apply over `existing`. A string setting stays a string, so
    /// `123456` or `null` given for a token is kept as text.
    pub fn value_over(&self, existing: Option<&Value>) -> Value {
        match (existing, &self.value) {
            (Some(Value::String(_)), Value::String(_)) => self.value.clone(),
            (Some(Value::String(_)), _) => Value::String(self.raw.clone()),
            _ => self.value.clone(),
        }
    }
}

/// Picks the override variables out of `vars` and returns them in canonical order:
/// shallower paths first, then by path, then by the original variable name. Applying
/// them in this order makes the result independent of declaration order.
pub fn collect_overrides<I>(vars: I) -> Vec<EnvOverride>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut overrides: Vec<EnvOverride> = vars
        .into_iter()
        .filter_map(|(key, raw)| parse_override(&key, raw))
        .collect();

    overrides.sort_by(|a, b| {
        a.path
            .len()
            .cmp(&b.path.len())
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.key.cmp(&b.key))
    });
    overrides
}

fn parse_override(key: &str, raw: String) -> Option<EnvOverride> {
    let k_lower = key.to_lowercase();
    let stripped = k_lower.strip_prefix(ENV_PREFIX)?;
    let path: Vec<String> = stripped
        .split(SEGMENT_SEPARATOR)
        .map(|s| s.to_string())
        .collect();
    if path.iter().any(|segment| segment.is_empty()) {
        log::warn!("Ignoring configuration override with an empty path segment: {key}");
        return None;
    }
    Some(EnvOverride {
        key: key.to_string(),
        path,
        value: parse_value(raw.clone()),
        raw,
    })
}

/// JSON when it parses (numbers, booleans, arrays, objects), the raw string otherwise.
pub fn parse_value(raw: String) -> Value {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

/// Reads the `KEY=VALUE` pairs of a `.env` file.
pub fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::DotEnv {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut pairs = Vec::new();
    for item in iter {
        let pair = item.map_err(|e| ConfigError::DotEnv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        pairs.push(pair);
    }
    Ok(pairs)
}
