mod models;

pub use models::{ApiRequest, RequestRecord, ResponseRecord};

use crate::auth::{AuthProvider, AuthSchemes, AuthSpec};
use crate::config::{HttpSettings, ResolvedConfig};
use crate::error::{ClientError, ConfigError, TransportError};
use crate::hooks::HookChain;
use crate::http::{
    join_url, truncate_body, HeaderSet, OutboundRequest, RawResponse, ReqwestTransport, Transport,
    JSON_CONTENT_TYPE,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub fn user_agent() -> String {
    format!("apiharness/{}", env!("CARGO_PKG_VERSION"))
}

/// Sends requests to one named service.
///
/// Base URL, credentials, timeout and retry policy all come from the resolved
/// configuration. Only timeouts and connection failures are retried, with a flat
/// delay; any HTTP response, whatever its status, is returned as is.
pub struct ApiClient {
    service: String,
    base_url: String,
    auth: Option<AuthSpec>,
    provider: Arc<AuthProvider>,
    transport: Arc<dyn Transport>,
    hooks: Arc<HookChain>,
    timeout: Duration,
    retry_count: u32,
    retry_delay: Duration,
    request_level: log::Level,
    body_limit: usize,
}

impl ApiClient {
    pub fn new(
        service: &str,
        config: &ResolvedConfig,
        auth: Option<AuthSpec>,
        provider: Arc<AuthProvider>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        let http: HttpSettings = config.http_settings()?;
        let logging = config.logging_settings()?;

        Ok(Self {
            service: service.to_string(),
            base_url: config.service_base_url(service)?.to_string(),
            auth,
            provider,
            transport,
            hooks: Arc::new(HookChain::new()),
            timeout: http.timeout()?,
            retry_count: http.retry_count,
            retry_delay: http.retry_delay()?,
            request_level: logging.request_level()?,
            body_limit: logging.body_limit,
        })
    }

    pub fn with_hooks(mut self, hooks: Arc<HookChain>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ResponseRecord, ClientError> {
        let mut outbound = self.prepare(&request).await?;
        self.hooks.before_request(&mut outbound)?;

        log::log!(
            self.request_level,
            "--> {} {}{}",
            outbound.method,
            outbound.url,
            outbound
                .body
                .as_deref()
                .map(|body| format!(" body: {}", truncate_body(body, self.body_limit)))
                .unwrap_or_default()
        );

        let started_at = Utc::now();
        let start = Instant::now();
        let (raw, attempts) = self.execute_with_retry(&outbound).await?;
        let elapsed = start.elapsed();

        log::log!(
            self.request_level,
            "<-- {} {} ({} ms, {} attempt(s)) body: {}",
            raw.status,
            outbound.url,
            elapsed.as_millis(),
            attempts,
            truncate_body(&raw.body, self.body_limit)
        );

        let RawResponse {
            status,
            headers,
            body,
        } = raw;
        let response = ResponseRecord {
            service: self.service.clone(),
            label: request.label,
            method: outbound.method,
            url: outbound.url.clone(),
            status,
            headers,
            body,
            elapsed,
            attempts,
            started_at,
        };

        if matches!(status, 401 | 403) && self.auth.as_ref().is_some_and(AuthSpec::has_login_flow) {
            let stale = outbound
                .headers
                .get("Authorization")
                .and_then(|value| value.strip_prefix("Bearer "));
            log::warn!(
                "Service '{}' answered {status}; dropping its cached token",
                self.service
            );
            self.provider.invalidate(&self.service, stale).await;
        }

        self.hooks.after_request(&outbound, &response)?;
        Ok(response)
    }

    /// Resolves URL and headers. Authentication headers go first; caller headers
    /// override them by name.
    async fn prepare(&self, request: &ApiRequest) -> Result<OutboundRequest, ClientError> {
        let mut headers = match &self.auth {
            Some(spec) => self.provider.credentials(&self.service, spec).await?,
            None => HeaderSet::new(),
        };
        headers.extend_override(&request.headers);
        headers.set_default("User-Agent", user_agent());

        let body = request.body.as_ref().map(|body| body.to_string());
        if body.is_some() {
            headers.set_default("Content-Type", JSON_CONTENT_TYPE);
        }

        Ok(OutboundRequest {
            method: request.method,
            url: join_url(&self.base_url, &request.path),
            query: request.query.clone(),
            headers,
            body,
        })
    }

    async fn execute_with_retry(
        &self,
        request: &OutboundRequest,
    ) -> Result<(RawResponse, u32), ClientError> {
        let max_attempts = self.retry_count.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.transport.execute(request, self.timeout).await {
                Ok(raw) => return Ok((raw, attempt)),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    log::warn!(
                        "{e}; retrying in {:.1}s (attempt {}/{max_attempts})",
                        self.retry_delay.as_secs_f64(),
                        attempt + 1
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(source) => return Err(transport_failure(source, attempt)),
            }
        }
    }
}

fn transport_failure(source: TransportError, attempts: u32) -> ClientError {
    ClientError::Transport { source, attempts }
}

/// Shared pieces for building clients: one configuration, one transport, one
/// token cache and one hook chain for every service of a run.
pub struct ClientFactory {
    config: Arc<ResolvedConfig>,
    transport: Arc<dyn Transport>,
    provider: Arc<AuthProvider>,
    schemes: AuthSchemes,
    hooks: Arc<HookChain>,
}

impl ClientFactory {
    /// Uses the reqwest transport, honouring `http.verify_ssl`.
    pub fn new(config: Arc<ResolvedConfig>) -> Result<Self, ClientError> {
        let verify_ssl = config.http_settings()?.verify_ssl;
        let transport = ReqwestTransport::new(verify_ssl)
            .map_err(|source| ClientError::Transport { source, attempts: 0 })?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: Arc<ResolvedConfig>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let provider = Arc::new(AuthProvider::new(Arc::clone(&config), Arc::clone(&transport))?);
        Ok(Self {
            config,
            transport,
            provider,
            schemes: AuthSchemes::default(),
            hooks: Arc::new(HookChain::new()),
        })
    }

    pub fn with_schemes(mut self, schemes: AuthSchemes) -> Self {
        self.schemes = schemes;
        self
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn config(&self) -> &Arc<ResolvedConfig> {
        &self.config
    }

    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    pub fn auth_provider(&self) -> &Arc<AuthProvider> {
        &self.provider
    }

    /// A client for `service`, authenticated per `auth.<service>` when present.
    pub fn client(&self, service: &str) -> Result<ApiClient, ClientError> {
        let auth = self.schemes.spec_for(&self.config, service)?;
        let client = ApiClient::new(
            service,
            &self.config,
            auth,
            Arc::clone(&self.provider),
            Arc::clone(&self.transport),
        )?;
        Ok(client.with_hooks(Arc::clone(&self.hooks)))
    }
}
