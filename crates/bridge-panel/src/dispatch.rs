use std::sync::Arc;

use crate::client::BridgeClient;
use crate::error::{PanelError, RequestError};
use crate::routes::{Action, ActionRequest, RouteTable};
use crate::status::{AggregateState, AggregateStatusView};

/// Runs lifecycle and sync actions. Not reentrant: the controller's busy
/// flag keeps a second dispatch from starting while one is in flight.
pub struct ActionDispatcher {
    client: BridgeClient,
    routes: Arc<RouteTable>,
    view: Arc<AggregateStatusView>,
}

impl ActionDispatcher {
    pub fn new(
        client: BridgeClient,
        routes: Arc<RouteTable>,
        view: Arc<AggregateStatusView>,
    ) -> Self {
        Self {
            client,
            routes,
            view,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Sends the action and, on a 2xx reply, refreshes the aggregate exactly
    /// once. A failed action never triggers a refresh.
    pub async fn dispatch(&self, action: Action) -> Result<AggregateState, PanelError> {
        let request = self.routes.action_request(action);
        self.execute(&request)
            .await
            .map_err(|source| PanelError::Action { action, source })?;
        self.view.refresh_all().await
    }

    pub(crate) async fn execute(&self, request: &ActionRequest) -> Result<(), RequestError> {
        tracing::info!(
            action = %request.label,
            method = %request.method,
            path = %request.path,
            timeout = ?request.timeout,
            "action dispatch"
        );
        match self.client.execute(request).await {
            Ok(response) => {
                tracing::info!(action = %request.label, status = response.status, "action succeeded");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(action = %request.label, error = %err, "action failed");
                Err(err)
            }
        }
    }

    pub(crate) async fn refresh(&self) -> Result<AggregateState, PanelError> {
        self.view.refresh_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::NoCredentials;
    use crate::test_utils::{healthy_transport, FakeReply, FakeTransport, SERVICE};
    use crate::transport::HttpMethod;

    fn dispatcher(transport: Arc<FakeTransport>) -> ActionDispatcher {
        let client = BridgeClient::new(transport, Arc::new(NoCredentials));
        let routes = Arc::new(RouteTable::new(SERVICE).expect("routes"));
        let view = Arc::new(AggregateStatusView::new(
            client.clone(),
            Arc::clone(&routes),
            None,
        ));
        ActionDispatcher::new(client, routes, view)
    }

    fn action_requests(transport: &FakeTransport) -> Vec<(HttpMethod, String)> {
        let routes = RouteTable::new(SERVICE).expect("routes");
        let reads: Vec<String> = crate::routes::SourceKind::ALL
            .iter()
            .map(|kind| routes.source(*kind).path.clone())
            .collect();
        transport
            .requests()
            .into_iter()
            .filter(|request| !(request.method == HttpMethod::Get && reads.contains(&request.path)))
            .map(|request| (request.method, request.path))
            .collect()
    }

    #[tokio::test]
    async fn each_action_uses_its_method() {
        for action in Action::ALL {
            let transport = healthy_transport();
            let route = RouteTable::new(SERVICE).expect("routes").action(action).clone();
            transport.respond(route.method, &route.path, FakeReply::Status(200));
            dispatcher(Arc::clone(&transport))
                .dispatch(action)
                .await
                .expect("dispatch");
            let sent = action_requests(&transport);
            let expected = match action {
                Action::Uninstall => HttpMethod::Delete,
                Action::Export => HttpMethod::Get,
                _ => HttpMethod::Post,
            };
            assert_eq!(sent, vec![(expected, route.path)], "{action}");
        }
    }

    #[tokio::test]
    async fn success_refreshes_exactly_once() {
        let transport = healthy_transport();
        transport.respond(
            HttpMethod::Post,
            "/api/sonic/sync",
            FakeReply::Status(202),
        );
        let state = dispatcher(Arc::clone(&transport))
            .dispatch(Action::Sync)
            .await
            .expect("dispatch");
        assert_eq!(state.sequence, 1);
        assert_eq!(transport.count(HttpMethod::Get, "/api/sonic/health"), 1);
    }

    #[tokio::test]
    async fn failure_names_action_and_skips_refresh() {
        let transport = healthy_transport();
        transport.respond(
            HttpMethod::Delete,
            "/api/library/integration/sonic",
            FakeReply::Status(409),
        );
        let err = dispatcher(Arc::clone(&transport))
            .dispatch(Action::Uninstall)
            .await
            .expect_err("uninstall should fail");
        assert!(matches!(
            err,
            PanelError::Action {
                action: Action::Uninstall,
                source: RequestError::Status { status: 409, .. }
            }
        ));
        assert!(err.to_string().starts_with("uninstall failed"));
        assert_eq!(transport.count(HttpMethod::Get, "/api/sonic/health"), 0);
    }

    #[tokio::test]
    async fn network_error_is_an_action_failure() {
        let transport = healthy_transport();
        transport.respond(
            HttpMethod::Post,
            "/api/sonic/rescan",
            FakeReply::NetworkError,
        );
        let err = dispatcher(transport)
            .dispatch(Action::Rescan)
            .await
            .expect_err("rescan should fail");
        assert!(err.to_string().contains("rescan failed"));
        assert!(err.to_string().contains("connection refused"));
    }
}
