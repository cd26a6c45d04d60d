use super::headers::HeaderSet;
use super::method::HttpMethod;
use crate::error::TransportError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A fully built request, ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderSet,
    pub body: Option<String>,
}

/// What came back over the wire, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderSet,
    pub body: String,
}

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + 'a>>;

/// One attempt at one request. Retrying is the caller's business.
pub trait Transport: Send + Sync {
    fn execute<'a>(&'a self, request: &'a OutboundRequest, timeout: Duration)
        -> TransportFuture<'a>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(verify_ssl: bool) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .map_err(|e| TransportError::Other {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        request: &'a OutboundRequest,
        timeout: Duration,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let mut req_builder = self
                .client
                .request(request.method.to_reqwest_method(), &request.url)
                .timeout(timeout);

            if !request.query.is_empty() {
                req_builder = req_builder.query(&request.query);
            }

            for (key, value) in request.headers.iter() {
                req_builder = req_builder.header(key, value);
            }

            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.clone());
            }

            let response = req_builder
                .send()
                .await
                .map_err(|e| classify(&request.url, e))?;
            let status = response.status().as_u16();

            let mut headers = HeaderSet::new();
            for (key, value) in response.headers() {
                if let Ok(value_str) = value.to_str() {
                    headers.append(key.as_str(), value_str);
                }
            }

            let body = response
                .text()
                .await
                .map_err(|e| classify(&request.url, e))?;

            Ok(RawResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn classify(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        TransportError::Other {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
