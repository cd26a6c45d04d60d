use super::spec::{scalar_to_string, LoginFlow};
use crate::assertion::path::extract;
use crate::config::ResolvedConfig;
use crate::error::AuthError;
use crate::http::{is_absolute_url, join_url, HeaderSet, OutboundRequest, Transport, JSON_CONTENT_TYPE};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};
use std::time::Duration;

const DEFAULT_LIFETIME_SECS: u64 = 24 * 60 * 60;
const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(token: String, lifetime_secs: u64) -> Self {
        let secs = lifetime_secs.min(MAX_LIFETIME_SECS) as i64;
        Self {
            token,
            expires_at: Utc::now() + chrono::Duration::seconds(secs),
        }
    }

    /// Usable while `now + refresh_threshold < expires_at`.
    pub fn is_fresh(&self, refresh_threshold: u64) -> bool {
        let threshold = refresh_threshold.min(MAX_LIFETIME_SECS) as i64;
        Utc::now() + chrono::Duration::seconds(threshold) < self.expires_at
    }
}

pub(crate) fn build_request(
    config: &ResolvedConfig,
    service: &str,
    login: &LoginFlow,
) -> Result<OutboundRequest, AuthError> {
    let url = if is_absolute_url(&login.path) {
        login.path.trim().to_string()
    } else {
        let base = config
            .service_base_url(service)
            .map_err(|e| AuthError::LoginFailed {
                service: service.to_string(),
                message: e.to_string(),
            })?;
        join_url(base, &login.path)
    };

    let body = match &login.body {
        Some(body) => body.clone(),
        None => fallback_body(config).ok_or_else(|| AuthError::InvalidSpec {
            service: service.to_string(),
            message: "login has no 'body' and common.username/common.password are not set"
                .to_string(),
        })?,
    };

    let mut headers = HeaderSet::new();
    headers.set("Content-Type", JSON_CONTENT_TYPE);
    for (name, value) in &login.headers {
        headers.set(name.as_str(), value.as_str());
    }

    Ok(OutboundRequest {
        method: login.method,
        url,
        query: Vec::new(),
        headers,
        body: Some(body.to_string()),
    })
}

/// First configured test user: `{"username", "password", "tenantName"}`.
fn fallback_body(config: &ResolvedConfig) -> Option<Value> {
    let username = first_entry(config.get("common.username")?)?;
    let password = first_entry(config.get("common.password")?)?;

    let mut body = Map::new();
    body.insert("username".to_string(), json!(username));
    body.insert("password".to_string(), json!(password));
    if let Some(tenant) = config.get("common.tenant_id").and_then(first_entry) {
        body.insert("tenantName".to_string(), json!(tenant));
    }
    Some(Value::Object(body))
}

fn first_entry(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.first().and_then(scalar_to_string),
        other => scalar_to_string(other),
    }
}

/// Hex SHA-1 over method, URL and body. Two logins with the same fingerprint
/// would obtain the same token.
pub(crate) fn fingerprint(request: &OutboundRequest) -> String {
    let mut hasher = Sha1::new();
    hasher.update(request.method.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(request.url.as_bytes());
    hasher.update(b"\n");
    hasher.update(request.body.as_deref().unwrap_or_default().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub(crate) async fn perform(
    transport: &dyn Transport,
    request: &OutboundRequest,
    timeout: Duration,
    service: &str,
    login: &LoginFlow,
) -> Result<CachedToken, AuthError> {
    let failed = |message: String| AuthError::LoginFailed {
        service: service.to_string(),
        message,
    };

    log::debug!("Logging in to service '{service}' at {}", request.url);
    let response = transport
        .execute(request, timeout)
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !(200..300).contains(&response.status) {
        return Err(failed(format!("login returned status {}", response.status)));
    }

    let document: Value = serde_json::from_str(&response.body)
        .map_err(|e| failed(format!("login response is not JSON: {e}")))?;

    let token = match extract(&document, &login.token_path).map_err(failed)? {
        Some(Value::String(token)) if !token.is_empty() => token,
        _ => {
            return Err(AuthError::TokenMissing {
                service: service.to_string(),
                path: login.token_path.clone(),
            })
        }
    };

    let lifetime = login
        .expires_in_path
        .as_deref()
        .and_then(|path| extract(&document, path).ok().flatten())
        .and_then(|value| seconds_from(&value))
        .or(login.expires_in)
        .unwrap_or(DEFAULT_LIFETIME_SECS);

    log::info!("Obtained token for service '{service}' (valid for {lifetime}s)");
    Ok(CachedToken::new(token, lifetime))
}

fn seconds_from(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use std::collections::BTreeMap;

    fn flow(path: &str, body: Option<Value>) -> LoginFlow {
        LoginFlow {
            path: path.to_string(),
            method: HttpMethod::POST,
            body,
            headers: BTreeMap::new(),
            token_path: "$.data.accessToken".to_string(),
            expires_in: None,
            expires_in_path: None,
            refresh_threshold: 0,
        }
    }

    #[test]
    fn test_build_request_joins_base_url() {
        let config = ResolvedConfig::new("t", json!({"http": {"factory": "http://h/api/"}}));
        let request =
            build_request(&config, "factory", &flow("/login", Some(json!({"u": 1})))).unwrap();
        assert_eq!(request.url, "http://h/api/login");
        assert_eq!(request.body.as_deref(), Some(r#"{"u":1}"#));
        assert_eq!(request.headers.get("content-type"), Some(JSON_CONTENT_TYPE));
    }

    #[test]
    fn test_build_request_uses_common_credentials() {
        let config = ResolvedConfig::new(
            "t",
            json!({
                "http": {"default": "http://h"},
                "common": {"username": ["alice", "bob"], "password": ["pw"], "tenant_id": [7]}
            }),
        );
        let request = build_request(&config, "svc", &flow("/login", None)).unwrap();
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"username": "alice", "password": "pw", "tenantName": "7"})
        );
    }

    #[test]
    fn test_build_request_without_any_body_is_invalid() {
        let config = ResolvedConfig::new("t", json!({"http": {"default": "http://h"}}));
        let err = build_request(&config, "svc", &flow("/login", None)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSpec { .. }));
    }

    #[test]
    fn test_fingerprint_depends_on_body() {
        let config = ResolvedConfig::new("t", json!({"http": {"default": "http://h"}}));
        let a = build_request(&config, "svc", &flow("/login", Some(json!({"u": "a"})))).unwrap();
        let b = build_request(&config, "svc", &flow("/login", Some(json!({"u": "b"})))).unwrap();
        assert_eq!(fingerprint(&a).len(), 40);
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_cached_token_freshness() {
        let token = CachedToken::new("t".to_string(), 60);
        assert!(token.is_fresh(0));
        assert!(token.is_fresh(30));
        assert!(!token.is_fresh(120));
    }

    #[test]
    fn test_lifetime_is_clamped() {
        let token = CachedToken::new("t".to_string(), u64::MAX);
        assert!(token.is_fresh(0));
        assert!(token.expires_at > Utc::now() + chrono::Duration::days(365 * 9));
    }

    #[test]
    fn test_seconds_from() {
        assert_eq!(seconds_from(&json!(3600)), Some(3600));
        assert_eq!(seconds_from(&json!("120")), Some(120));
        assert_eq!(seconds_from(&json!(true)), None);
    }
}
