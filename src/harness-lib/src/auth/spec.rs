use crate::http::{HeaderSet, HttpMethod};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_TOKEN_PATH: &str = "$.data.accessToken";

/// How to authenticate against one named service.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthSpec {
    Bearer(BearerSpec),
    Basic { username: String, password: String },
    ApiKey { header: String, value: String },
    Custom { headers: HeaderSet },
}

impl AuthSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthSpec::Bearer(_) => "bearer",
            AuthSpec::Basic { .. } => "basic",
            AuthSpec::ApiKey { .. } => "api_key",
            AuthSpec::Custom { .. } => "custom",
        }
    }

    /// Only a Bearer login flow has a token worth dropping on 401/403.
    pub fn has_login_flow(&self) -> bool {
        matches!(self, AuthSpec::Bearer(BearerSpec { token: None, login: Some(_), .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BearerSpec {
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub token: Option<String>,
    #[serde(default)]
    pub login: Option<LoginFlow>,
    /// Sent alongside the token, e.g. a tenant header.
    #[serde(default, deserialize_with = "deserialize_header_map")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginFlow {
    /// Relative to the service base URL, or absolute.
    pub path: String,
    #[serde(default = "default_login_method")]
    pub method: HttpMethod,
    /// JSON body. When absent it is built from `common.username`/`common.password`.
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_header_map")]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    /// Token lifetime in seconds when the response does not say.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub expires_in_path: Option<String>,
    /// Seconds before expiry at which the token is considered stale.
    #[serde(default)]
    pub refresh_threshold: u64,
}

fn default_login_method() -> HttpMethod {
    HttpMethod::POST
}

fn default_token_path() -> String {
    DEFAULT_TOKEN_PATH.to_string()
}

/// Header values may be written as numbers or booleans in YAML (`tenant-id: 1`).
pub(crate) fn deserialize_header_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| match scalar_to_string(&value) {
            Some(text) => Ok((name, text)),
            None => Err(serde::de::Error::custom(format!(
                "header '{name}' must be a string, number or boolean"
            ))),
        })
        .collect()
}

fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(&value).map(Some).ok_or_else(|| {
            serde::de::Error::custom("expected a string, number or boolean")
        }),
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
