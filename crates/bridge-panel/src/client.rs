use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::credentials::{CredentialError, CredentialProvider};
use crate::error::RequestError;
use crate::routes::ActionRequest;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Shared request path for status reads and actions: attaches the bearer
/// token, enforces the per-request timeout and maps non-2xx to an error.
#[derive(Clone)]
pub struct BridgeClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl BridgeClient {
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn authorization(&self) -> Result<Option<String>, CredentialError> {
        self.credentials.bearer_token()
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<T, RequestError> {
        let response = self
            .send(HttpMethod::Get, path, None, bearer, timeout)
            .await?;
        serde_json::from_str(&response.body).map_err(|err| RequestError::Payload {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    pub async fn execute(&self, request: &ActionRequest) -> Result<HttpResponse, RequestError> {
        let bearer = self.authorization()?;
        let body = request.body.as_ref().map(|value| value.to_string());
        self.send(request.method, &request.path, body, bearer, request.timeout)
            .await
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        bearer: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, RequestError> {
        let request = HttpRequest {
            method,
            path: path.to_string(),
            body,
            bearer,
        };
        let response = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(request))
                .await
                .map_err(|_| RequestError::Timeout {
                    method,
                    path: path.to_string(),
                    timeout: limit,
                })??,
            None => self.transport.send(request).await?,
        };
        if !response.is_success() {
            return Err(RequestError::Status {
                method,
                path: path.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }
}
