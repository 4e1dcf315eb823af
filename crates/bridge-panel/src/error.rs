use std::time::Duration;

use bridge_protocol::BuildProfile;

use crate::credentials::CredentialError;
use crate::routes::Action;
use crate::transport::{HttpMethod, TransportError};

/// Failure of a single request against the bridge API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("HTTP {status} from {method} {path}")]
    Status {
        method: HttpMethod,
        path: String,
        status: u16,
    },
    #[error("{method} {path} timed out after {timeout:?}")]
    Timeout {
        method: HttpMethod,
        path: String,
        timeout: Duration,
    },
    #[error("malformed payload from {path}: {message}")]
    Payload { path: String, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("invalid service name {0:?}")]
    InvalidService(String),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("route for {label} is malformed: {method} {path}")]
    Malformed {
        label: String,
        method: HttpMethod,
        path: String,
    },
    #[error("routes for {first} and {second} collide on {method} {path}")]
    Collision {
        first: String,
        second: String,
        method: HttpMethod,
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error("another action is already in progress")]
    Busy,
    #[error("panel is not ready")]
    NotReady,
    #[error("panel has been torn down")]
    Detached,
    #[error("{action} failed: {source}")]
    Action {
        action: Action,
        #[source]
        source: RequestError,
    },
    #[error("build {profile} failed: {source}")]
    Build {
        profile: BuildProfile,
        #[source]
        source: RequestError,
    },
    #[error("status refresh could not start: {0}")]
    Refresh(#[from] CredentialError),
    #[error(transparent)]
    Route(#[from] RouteError),
}
