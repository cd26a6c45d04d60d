use super::login::{self, CachedToken};
use super::spec::{AuthSpec, BearerSpec, LoginFlow};
use crate::config::ResolvedConfig;
use crate::error::{AuthError, ConfigError};
use crate::http::{HeaderSet, Transport};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CredentialKey {
    service: String,
    fingerprint: String,
}

type Slot = Arc<tokio::sync::Mutex<Option<CachedToken>>>;

/// Turns an [`AuthSpec`] into request headers.
///
/// Tokens obtained through a Bearer login flow are cached per service and
/// credential fingerprint. Each key has its own async lock, so concurrent callers
/// for the same credentials share a single login request.
pub struct AuthProvider {
    config: Arc<ResolvedConfig>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    slots: Mutex<HashMap<CredentialKey, Slot>>,
    seeded: Mutex<HashMap<String, CachedToken>>,
}

impl AuthProvider {
    pub fn new(
        config: Arc<ResolvedConfig>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        let timeout = config.http_settings()?.timeout()?;
        Ok(Self {
            config,
            transport,
            timeout,
            slots: Mutex::new(HashMap::new()),
            seeded: Mutex::new(HashMap::new()),
        })
    }

    pub async fn credentials(
        &self,
        service: &str,
        spec: &AuthSpec,
    ) -> Result<HeaderSet, AuthError> {
        let mut headers = HeaderSet::new();
        match spec {
            AuthSpec::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                headers.set(AUTHORIZATION, format!("Basic {encoded}"));
            }
            AuthSpec::ApiKey { header, value } => {
                headers.set(header.as_str(), value.as_str());
            }
            AuthSpec::Custom { headers: custom } => {
                headers.extend_override(custom);
            }
            AuthSpec::Bearer(bearer) => {
                let token = self.bearer_token(service, bearer).await?;
                headers.set(AUTHORIZATION, format!("Bearer {token}"));
                for (name, value) in &bearer.headers {
                    headers.set(name.as_str(), value.as_str());
                }
            }
        }
        Ok(headers)
    }

    /// Drops cached login tokens for `service`. With `stale_token`, only slots still
    /// holding that token are cleared, so a token refreshed meanwhile by another
    /// caller survives.
    pub async fn invalidate(&self, service: &str, stale_token: Option<&str>) {
        {
            let mut seeded = self.seeded.lock().unwrap_or_else(|e| e.into_inner());
            if seeded
                .get(service)
                .is_some_and(|cached| matches_stale(stale_token, &cached.token))
            {
                seeded.remove(service);
            }
        }

        let slots: Vec<Slot> = {
            let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots
                .iter()
                .filter(|(key, _)| key.service == service)
                .map(|(_, slot)| Arc::clone(slot))
                .collect()
        };

        for slot in slots {
            let mut guard = slot.lock().await;
            if guard
                .as_ref()
                .is_some_and(|cached| matches_stale(stale_token, &cached.token))
            {
                log::debug!("Invalidated cached token for service '{service}'");
                *guard = None;
            }
        }
    }

    /// Seeds a token obtained elsewhere. It takes precedence over any login flow
    /// until it expires or is invalidated.
    pub fn set_token(&self, service: &str, token: impl Into<String>, expires_in: Option<u64>) {
        let cached = CachedToken::new(token.into(), expires_in.unwrap_or(24 * 60 * 60));
        self.seeded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(service.to_string(), cached);
    }

    pub fn clear(&self) {
        self.seeded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    async fn bearer_token(&self, service: &str, bearer: &BearerSpec) -> Result<String, AuthError> {
        let threshold = bearer.login.as_ref().map_or(0, |l| l.refresh_threshold);
        if let Some(token) = self.seeded_token(service, threshold) {
            return Ok(token);
        }

        match (&bearer.token, &bearer.login) {
            (Some(token), _) => Ok(token.clone()),
            (None, Some(flow)) => self.login_token(service, flow).await,
            (None, None) => Err(AuthError::InvalidSpec {
                service: service.to_string(),
                message: "bearer auth needs either 'token' or 'login'".to_string(),
            }),
        }
    }

    fn seeded_token(&self, service: &str, threshold: u64) -> Option<String> {
        let seeded = self.seeded.lock().unwrap_or_else(|e| e.into_inner());
        seeded
            .get(service)
            .filter(|cached| cached.is_fresh(threshold))
            .map(|cached| cached.token.clone())
    }

    async fn login_token(&self, service: &str, flow: &LoginFlow) -> Result<String, AuthError> {
        let request = login::build_request(&self.config, service, flow)?;
        let key = CredentialKey {
            service: service.to_string(),
            fingerprint: login::fingerprint(&request),
        };

        let slot = self.slot(key);
        let mut guard = slot.lock().await;
        if let Some(cached) = guard.as_ref().filter(|c| c.is_fresh(flow.refresh_threshold)) {
            log::trace!("Reusing cached token for service '{service}'");
            return Ok(cached.token.clone());
        }

        let fresh = login::perform(
            self.transport.as_ref(),
            &request,
            self.timeout,
            service,
            flow,
        )
        .await?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    fn slot(&self, key: CredentialKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(key).or_default())
    }
}

fn matches_stale(stale_token: Option<&str>, token: &str) -> bool {
    stale_token.map_or(true, |stale| stale == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, OutboundRequest, RawResponse, TransportFuture};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every login with `token-<n>`, counting calls.
    struct CountingLogin {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingLogin {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for CountingLogin {
        fn execute<'a>(
            &'a self,
            _request: &'a OutboundRequest,
            _timeout: Duration,
        ) -> TransportFuture<'a> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(self.delay).await;
                Ok(RawResponse {
                    status: 200,
                    headers: HeaderSet::new(),
                    body: json!({"data": {"accessToken": format!("token-{n}")}}).to_string(),
                })
            })
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn execute<'a>(
            &'a self,
            request: &'a OutboundRequest,
            _timeout: Duration,
        ) -> TransportFuture<'a> {
            Box::pin(async move {
                Err(TransportError::Connect {
                    url: request.url.clone(),
                    message: "refused".to_string(),
                })
            })
        }
    }

    fn config() -> Arc<ResolvedConfig> {
        Arc::new(ResolvedConfig::new(
            "test",
            json!({"http": {"default": "http://localhost:1", "timeout": 5}}),
        ))
    }

    fn login_spec(refresh_threshold: u64) -> AuthSpec {
        AuthSpec::Bearer(BearerSpec {
            token: None,
            login: Some(LoginFlow {
                path: "/login".to_string(),
                method: HttpMethod::POST,
                body: Some(json!({"username": "u", "password": "p"})),
                headers: BTreeMap::new(),
                token_path: "$.data.accessToken".to_string(),
                expires_in: Some(3600),
                expires_in_path: None,
                refresh_threshold,
            }),
            headers: BTreeMap::from([("tenant-id".to_string(), "1".to_string())]),
        })
    }

    #[tokio::test]
    async fn test_basic_header() {
        let provider = AuthProvider::new(config(), Arc::new(FailingTransport)).unwrap();
        let spec = AuthSpec::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        let headers = provider.credentials("svc", &spec).await.unwrap();
        assert_eq!(headers.get("authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn test_api_key_and_static_bearer() {
        let provider = AuthProvider::new(config(), Arc::new(FailingTransport)).unwrap();

        let api_key = AuthSpec::ApiKey {
            header: "X-Key".to_string(),
            value: "secret".to_string(),
        };
        let headers = provider.credentials("svc", &api_key).await.unwrap();
        assert_eq!(headers.get("x-key"), Some("secret"));

        let bearer = AuthSpec::Bearer(BearerSpec {
            token: Some("static".to_string()),
            login: None,
            headers: BTreeMap::new(),
        });
        let headers = provider.credentials("svc", &bearer).await.unwrap();
        assert_eq!(headers.get("Authorization"), Some("Bearer static"));
    }

    #[tokio::test]
    async fn test_login_token_is_cached() {
        let transport = CountingLogin::new(Duration::ZERO);
        let provider = AuthProvider::new(config(), transport.clone()).unwrap();
        let spec = login_spec(0);

        let first = provider.credentials("svc", &spec).await.unwrap();
        let second = provider.credentials("svc", &spec).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(first.get("authorization"), Some("Bearer token-1"));
        assert_eq!(first.get("tenant-id"), Some("1"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_login() {
        let transport = CountingLogin::new(Duration::from_millis(50));
        let provider = Arc::new(AuthProvider::new(config(), transport.clone()).unwrap());
        let spec = login_spec(0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                let spec = spec.clone();
                tokio::spawn(async move { provider.credentials("svc", &spec).await })
            })
            .collect();

        for handle in handles {
            let headers = handle.await.unwrap().unwrap();
            assert_eq!(headers.get("authorization"), Some("Bearer token-1"));
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_threshold_beyond_lifetime_forces_login() {
        let transport = CountingLogin::new(Duration::ZERO);
        let provider = AuthProvider::new(config(), transport.clone()).unwrap();
        let spec = login_spec(7200);

        provider.credentials("svc", &spec).await.unwrap();
        let headers = provider.credentials("svc", &spec).await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(headers.get("authorization"), Some("Bearer token-2"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_login() {
        let transport = CountingLogin::new(Duration::ZERO);
        let provider = AuthProvider::new(config(), transport.clone()).unwrap();
        let spec = login_spec(0);

        provider.credentials("svc", &spec).await.unwrap();
        provider.invalidate("svc", Some("some-other-token")).await;
        provider.credentials("svc", &spec).await.unwrap();
        assert_eq!(transport.calls(), 1);

        provider.invalidate("svc", Some("token-1")).await;
        let headers = provider.credentials("svc", &spec).await.unwrap();
        assert_eq!(transport.calls(), 2);
        assert_eq!(headers.get("authorization"), Some("Bearer token-2"));
    }

    #[tokio::test]
    async fn test_set_token_takes_precedence_and_clear_drops_it() {
        let transport = CountingLogin::new(Duration::ZERO);
        let provider = AuthProvider::new(config(), transport.clone()).unwrap();
        let spec = login_spec(0);

        provider.set_token("svc", "seeded", Some(600));
        let headers = provider.credentials("svc", &spec).await.unwrap();
        assert_eq!(headers.get("authorization"), Some("Bearer seeded"));
        assert_eq!(transport.calls(), 0);

        provider.clear();
        let headers = provider.credentials("svc", &spec).await.unwrap();
        assert_eq!(headers.get("authorization"), Some("Bearer token-1"));
    }

    #[tokio::test]
    async fn test_login_transport_failure_is_auth_error() {
        let provider = AuthProvider::new(config(), Arc::new(FailingTransport)).unwrap();
        let err = provider.credentials("svc", &login_spec(0)).await.unwrap_err();
        assert!(matches!(err, AuthError::LoginFailed { .. }));
    }
}
