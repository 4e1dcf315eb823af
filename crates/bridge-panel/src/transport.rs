use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

static HTTP_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<String>,
    pub bearer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status / 100 == 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
}

/// Issues one HTTP request against the bridge API. Any status code is a
/// successful send; interpreting it is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        join_base_path(base_url, "/").map_err(TransportError::InvalidUrl)?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let request_id = HTTP_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        let method = request.method;
        let body_len = request.body.as_ref().map(|value| value.len()).unwrap_or(0);
        tracing::debug!(
            request_id,
            method = %method,
            path = %request.path,
            body_len,
            "bridge http start"
        );
        let url = join_base_path(&self.base_url, &request.path).map_err(|err| {
            tracing::warn!(request_id, error = %err, "bridge http invalid url");
            TransportError::InvalidUrl(err)
        })?;
        let mut builder = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };
        builder = builder.header(ACCEPT, "application/json");
        if let Some(token) = request.bearer.as_deref() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    request_id,
                    method = %method,
                    path = %request.path,
                    timeout = err.is_timeout(),
                    connect = err.is_connect(),
                    error = %err,
                    "bridge http request error"
                );
                return Err(TransportError::Network(err.to_string()));
            }
        };
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let body = response.text().await.map_err(|err| {
            tracing::warn!(request_id, error = %err, "bridge http read error");
            TransportError::Network(err.to_string())
        })?;
        tracing::debug!(
            request_id,
            status,
            content_type = %content_type,
            body_len = body.len(),
            body = %escape_log_body(&body),
            "bridge http done"
        );
        Ok(HttpResponse { status, body })
    }
}

pub fn join_base_path(base: &str, path: &str) -> Result<String, String> {
    let base = base.trim();
    if base.is_empty() {
        return Err("base_url is empty".to_string());
    }
    if !base.starts_with("http://") && !base.starts_with("https://") {
        return Err(format!("base_url {base} must start with http:// or https://"));
    }
    let normalized_base = base.trim_end_matches('/');
    let normalized_path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    Ok(format!("{normalized_base}{normalized_path}"))
}

fn escape_log_body(body: &str) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }
    body.replace('\n', "\\n").replace('\r', "\\r")
}
