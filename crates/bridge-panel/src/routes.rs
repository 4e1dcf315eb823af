use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bridge_protocol::BuildProfile;
use serde::Serialize;
use serde_json::Value;

use crate::error::RouteError;
use crate::transport::HttpMethod;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Install,
    Enable,
    Disable,
    Uninstall,
    Sync,
    Rescan,
    Rebuild,
    Export,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Install,
        Action::Enable,
        Action::Disable,
        Action::Uninstall,
        Action::Sync,
        Action::Rescan,
        Action::Rebuild,
        Action::Export,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Enable => "enable",
            Action::Disable => "disable",
            Action::Uninstall => "uninstall",
            Action::Sync => "sync",
            Action::Rescan => "rescan",
            Action::Rebuild => "rebuild",
            Action::Export => "export",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = RouteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| RouteError::UnknownAction(value.to_string()))
    }
}

/// The five read endpoints polled on every refresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Platform,
    Integration,
    Health,
    Sync,
    Builds,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Platform,
        SourceKind::Integration,
        SourceKind::Health,
        SourceKind::Sync,
        SourceKind::Builds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Platform => "platform",
            SourceKind::Integration => "integration",
            SourceKind::Health => "health",
            SourceKind::Sync => "sync",
            SourceKind::Builds => "builds",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
}

impl Route {
    fn new(method: HttpMethod, path: String) -> Self {
        Self { method, path }
    }
}

/// One invocation against an action endpoint. Built fresh per call.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRequest {
    pub label: String,
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct RouteTable {
    service: String,
    actions: HashMap<Action, Route>,
    sources: HashMap<SourceKind, Route>,
    build: Route,
}

impl RouteTable {
    pub fn new(service: &str) -> Result<Self, RouteError> {
        let service = service.trim();
        validate_service(service)?;
        let actions: HashMap<Action, Route> = Action::ALL
            .into_iter()
            .map(|action| (action, action_route(service, action)))
            .collect();
        let sources: HashMap<SourceKind, Route> = SourceKind::ALL
            .into_iter()
            .map(|kind| (kind, Route::new(HttpMethod::Get, source_path(service, kind))))
            .collect();
        let build = Route::new(
            HttpMethod::Post,
            format!("/api/platform/{service}/build"),
        );
        let table = Self {
            service: service.to_string(),
            actions,
            sources,
            build,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn action(&self, action: Action) -> &Route {
        // Every action is inserted by `new`, and `validate` checks it.
        &self.actions[&action]
    }

    pub fn source(&self, kind: SourceKind) -> &Route {
        &self.sources[&kind]
    }

    pub fn action_request(&self, action: Action) -> ActionRequest {
        let route = self.action(action);
        ActionRequest {
            label: action.as_str().to_string(),
            method: route.method,
            path: route.path.clone(),
            body: None,
            timeout: None,
        }
    }

    pub fn build_request(&self, profile: BuildProfile, timeout: Duration) -> ActionRequest {
        ActionRequest {
            label: format!("build {profile}"),
            method: self.build.method,
            path: self.build.path.clone(),
            body: Some(serde_json::json!({ "profile": profile })),
            timeout: Some(timeout),
        }
    }

    fn labelled_routes(&self) -> Vec<(String, &Route)> {
        let mut routes: Vec<(String, &Route)> = Vec::new();
        for action in Action::ALL {
            if let Some(route) = self.actions.get(&action) {
                routes.push((action.as_str().to_string(), route));
            }
        }
        for kind in SourceKind::ALL {
            if let Some(route) = self.sources.get(&kind) {
                routes.push((format!("{} status", kind.as_str()), route));
            }
        }
        routes.push(("build".to_string(), &self.build));
        routes
    }

    fn validate(&self) -> Result<(), RouteError> {
        if self.actions.len() != Action::ALL.len() || self.sources.len() != SourceKind::ALL.len() {
            return Err(RouteError::InvalidService(self.service.clone()));
        }
        let routes = self.labelled_routes();
        let mut seen: HashMap<(HttpMethod, &str), &str> = HashMap::new();
        for (label, route) in &routes {
            if !is_well_formed(&route.path) {
                return Err(RouteError::Malformed {
                    label: label.clone(),
                    method: route.method,
                    path: route.path.clone(),
                });
            }
            if let Some(first) = seen.insert((route.method, route.path.as_str()), label) {
                return Err(RouteError::Collision {
                    first: first.to_string(),
                    second: label.clone(),
                    method: route.method,
                    path: route.path.clone(),
                });
            }
        }
        Ok(())
    }
}

fn action_route(service: &str, action: Action) -> Route {
    match action {
        Action::Install | Action::Enable | Action::Disable => Route::new(
            HttpMethod::Post,
            format!("/api/library/integration/{service}/{action}"),
        ),
        Action::Uninstall => Route::new(
            HttpMethod::Delete,
            format!("/api/library/integration/{service}"),
        ),
        Action::Sync | Action::Rescan | Action::Rebuild => {
            Route::new(HttpMethod::Post, format!("/api/{service}/{action}"))
        }
        Action::Export => Route::new(HttpMethod::Get, format!("/api/{service}/export")),
    }
}

fn source_path(service: &str, kind: SourceKind) -> String {
    match kind {
        SourceKind::Platform => format!("/api/platform/{service}/status"),
        SourceKind::Integration => format!("/api/library/integration/{service}"),
        SourceKind::Health => format!("/api/{service}/health"),
        SourceKind::Sync => format!("/api/{service}/db/status"),
        SourceKind::Builds => format!("/api/platform/{service}/builds"),
    }
}

fn validate_service(service: &str) -> Result<(), RouteError> {
    let valid = !service.is_empty()
        && service
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if !valid {
        return Err(RouteError::InvalidService(service.to_string()));
    }
    Ok(())
}

fn is_well_formed(path: &str) -> bool {
    path.starts_with("/api/")
        && !path.ends_with('/')
        && !path.contains("//")
        && !path.chars().any(char::is_whitespace)
}
