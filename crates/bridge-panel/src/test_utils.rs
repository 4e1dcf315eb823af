use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

pub(crate) const SERVICE: &str = "sonic";

#[derive(Clone, Debug)]
pub(crate) enum FakeReply {
    Json(u16, Value),
    Status(u16),
    Raw(u16, String),
    NetworkError,
    Hang,
}

type Key = (HttpMethod, String);

/// Scripted transport: sticky per-route replies, optional one-shot replies
/// that take precedence, and an optional gate that holds action requests
/// until released.
#[derive(Default)]
pub(crate) struct FakeTransport {
    sticky: Mutex<HashMap<Key, FakeReply>>,
    queued: Mutex<HashMap<Key, VecDeque<FakeReply>>>,
    requests: Mutex<Vec<HttpRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeTransport {
    pub(crate) fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (transport, gate)
    }

    pub(crate) fn respond(&self, method: HttpMethod, path: &str, reply: FakeReply) {
        self.sticky
            .lock()
            .unwrap()
            .insert((method, path.to_string()), reply);
    }

    pub(crate) fn respond_once(&self, method: HttpMethod, path: &str, reply: FakeReply) {
        self.queued
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    fn reply_for(&self, key: &Key) -> Option<FakeReply> {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(VecDeque::pop_front)
        {
            return Some(reply);
        }
        self.sticky.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = (request.method, request.path.clone());
        let is_read = request.method == HttpMethod::Get && !request.path.ends_with("/export");
        self.requests.lock().unwrap().push(request);
        if let (Some(gate), false) = (self.gate.as_ref(), is_read) {
            gate.acquire().await.unwrap().forget();
        }
        tokio::task::yield_now().await;
        match self.reply_for(&key) {
            Some(FakeReply::Json(status, value)) => Ok(HttpResponse {
                status,
                body: value.to_string(),
            }),
            Some(FakeReply::Raw(status, body)) => Ok(HttpResponse { status, body }),
            Some(FakeReply::Status(status)) => Ok(HttpResponse {
                status,
                body: String::new(),
            }),
            Some(FakeReply::NetworkError) => {
                Err(TransportError::Network("connection refused".to_string()))
            }
            Some(FakeReply::Hang) => {
                std::future::pending::<Result<HttpResponse, TransportError>>().await
            }
            None => Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

pub(crate) fn install_healthy_routes(transport: &FakeTransport) {
    transport.respond(
        HttpMethod::Get,
        "/api/platform/sonic/status",
        FakeReply::Json(200, json!({ "available": true, "version": "1.2.0" })),
    );
    transport.respond(
        HttpMethod::Get,
        "/api/library/integration/sonic",
        FakeReply::Json(
            200,
            json!({ "integration": { "name": "sonic", "installed": false, "enabled": false } }),
        ),
    );
    transport.respond(
        HttpMethod::Get,
        "/api/sonic/health",
        FakeReply::Json(200, json!({ "status": "ok" })),
    );
    transport.respond(
        HttpMethod::Get,
        "/api/sonic/db/status",
        FakeReply::Json(
            200,
            json!({ "db_exists": true, "record_count": 42, "last_sync": "2026-10-01T08:00:00Z" }),
        ),
    );
    transport.respond(
        HttpMethod::Get,
        "/api/platform/sonic/builds",
        FakeReply::Json(200, json!({ "builds": [] })),
    );
}

pub(crate) fn healthy_transport() -> Arc<FakeTransport> {
    let transport = FakeTransport::default();
    install_healthy_routes(&transport);
    Arc::new(transport)
}

pub(crate) fn set_integration(transport: &FakeTransport, installed: bool, enabled: bool) {
    transport.respond(
        HttpMethod::Get,
        "/api/library/integration/sonic",
        FakeReply::Json(
            200,
            json!({ "integration": { "name": "sonic", "installed": installed, "enabled": enabled } }),
        ),
    );
}
