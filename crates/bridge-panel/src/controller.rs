use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bridge_protocol::BuildProfile;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::build::{BuildRequestFlow, DEFAULT_BUILD_TIMEOUT};
use crate::client::BridgeClient;
use crate::credentials::CredentialProvider;
use crate::dispatch::ActionDispatcher;
use crate::error::PanelError;
use crate::events::PanelEvent;
use crate::lifecycle::{available_actions, can_build};
use crate::routes::{Action, RouteTable};
use crate::status::{AggregateState, AggregateStatusView};
use crate::transport::Transport;

pub const DEFAULT_SERVICE: &str = "sonic";
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
pub struct PanelOptions {
    pub service: String,
    pub build_timeout: Duration,
    pub status_timeout: Option<Duration>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            status_timeout: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPhase {
    Idle,
    Loading,
    Ready,
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Mount failed; shown in place of the panel content.
    Blocking,
    /// An action or build failed; shown next to the last-known status.
    Action,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PanelNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl PanelNotice {
    fn blocking(message: String) -> Self {
        Self {
            kind: NoticeKind::Blocking,
            message,
        }
    }

    fn action(message: String) -> Self {
        Self {
            kind: NoticeKind::Action,
            message,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PanelUiState {
    pub loading: bool,
    pub busy: bool,
    pub error: Option<PanelNotice>,
    pub aggregate: Option<AggregateState>,
    #[serde(skip)]
    mounted: bool,
}

impl PanelUiState {
    pub fn phase(&self) -> PanelPhase {
        if !self.mounted {
            PanelPhase::Idle
        } else if self.loading {
            PanelPhase::Loading
        } else if self.busy {
            PanelPhase::Busy
        } else {
            PanelPhase::Ready
        }
    }

    /// Keeps the newest cycle: a slower refresh that settles after a newer
    /// one must not overwrite it.
    fn replace_aggregate(&mut self, aggregate: AggregateState) {
        let newer = self
            .aggregate
            .as_ref()
            .map_or(true, |current| aggregate.sequence > current.sequence);
        if newer {
            self.aggregate = Some(aggregate);
        }
    }

    fn notice_for(&self, message: String) -> PanelNotice {
        if self.aggregate.is_some() {
            PanelNotice::action(message)
        } else {
            PanelNotice::blocking(message)
        }
    }
}

struct PanelShared {
    ui: Mutex<PanelUiState>,
    lifetime: CancellationToken,
    event_tx: broadcast::Sender<PanelEvent>,
}

impl PanelShared {
    fn lock(&self) -> MutexGuard<'_, PanelUiState> {
        self.ui.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` unless the panel has been torn down. The lifetime check
    /// happens under the lock so a teardown cannot interleave with a write.
    fn transition<R>(
        &self,
        f: impl FnOnce(&mut PanelUiState) -> Result<R, PanelError>,
    ) -> Result<R, PanelError> {
        let mut ui = self.lock();
        if self.lifetime.is_cancelled() {
            return Err(PanelError::Detached);
        }
        let result = f(&mut ui)?;
        let _ = self.event_tx.send(PanelEvent::StateChanged { state: ui.clone() });
        Ok(result)
    }

    fn update(&self, f: impl FnOnce(&mut PanelUiState)) -> Result<(), PanelError> {
        self.transition(|ui| {
            f(ui);
            Ok(())
        })
    }

    fn emit(&self, event: PanelEvent) {
        if !self.lifetime.is_cancelled() {
            let _ = self.event_tx.send(event);
        }
    }
}

/// Clears `busy` when an action future is dropped before it settles. A
/// settled action clears it in `finish_action`, ahead of `ActionFinished`.
/// After teardown the write is skipped.
struct BusyGuard {
    shared: Arc<PanelShared>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let _ = self.shared.update(|ui| ui.busy = false);
    }
}

pub struct PanelController {
    shared: Arc<PanelShared>,
    routes: Arc<RouteTable>,
    view: Arc<AggregateStatusView>,
    dispatcher: Arc<ActionDispatcher>,
    builds: BuildRequestFlow,
}

impl PanelController {
    pub fn new(
        options: PanelOptions,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, PanelError> {
        let routes = Arc::new(RouteTable::new(&options.service)?);
        let client = BridgeClient::new(transport, credentials);
        let view = Arc::new(AggregateStatusView::new(
            client.clone(),
            Arc::clone(&routes),
            options.status_timeout,
        ));
        let dispatcher = Arc::new(ActionDispatcher::new(
            client,
            Arc::clone(&routes),
            Arc::clone(&view),
        ));
        let builds = BuildRequestFlow::new(Arc::clone(&dispatcher), options.build_timeout);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            shared: Arc::new(PanelShared {
                ui: Mutex::new(PanelUiState::default()),
                lifetime: CancellationToken::new(),
                event_tx,
            }),
            routes,
            view,
            dispatcher,
            builds,
        })
    }

    pub fn service(&self) -> &str {
        self.routes.service()
    }

    pub fn state(&self) -> PanelUiState {
        self.shared.lock().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.shared.event_tx.subscribe()
    }

    pub fn available_actions(&self) -> Vec<Action> {
        self.state()
            .aggregate
            .as_ref()
            .map(available_actions)
            .unwrap_or_default()
    }

    pub fn can_build(&self) -> bool {
        self.state().aggregate.as_ref().map_or(false, can_build)
    }

    /// First load of the panel. Calling it again on a mounted panel is a
    /// manual refresh.
    pub async fn mount(&self) -> Result<(), PanelError> {
        let fresh = self.shared.transition(|ui| {
            if ui.mounted {
                return Ok(false);
            }
            ui.mounted = true;
            ui.loading = true;
            ui.error = None;
            Ok(true)
        })?;
        if !fresh {
            return self.refresh().await;
        }
        tracing::info!(service = %self.service(), "panel mounting");
        match self.guarded(self.view.refresh_all()).await? {
            Ok(aggregate) => self.shared.update(|ui| {
                ui.loading = false;
                ui.replace_aggregate(aggregate);
            }),
            Err(err) => {
                tracing::warn!(error = %err, "panel mount failed");
                self.shared.update(|ui| {
                    ui.loading = false;
                    ui.error = Some(PanelNotice::blocking(err.to_string()));
                })?;
                Err(err)
            }
        }
    }

    pub async fn refresh(&self) -> Result<(), PanelError> {
        self.shared.transition(|ui| match ui.phase() {
            PanelPhase::Idle | PanelPhase::Loading => Err(PanelError::NotReady),
            PanelPhase::Busy => Err(PanelError::Busy),
            PanelPhase::Ready => {
                ui.error = None;
                Ok(())
            }
        })?;
        match self.guarded(self.view.refresh_all()).await? {
            Ok(aggregate) => self.shared.update(|ui| ui.replace_aggregate(aggregate)),
            Err(err) => {
                tracing::warn!(error = %err, "panel refresh failed");
                self.shared.update(|ui| ui.error = Some(ui.notice_for(err.to_string())))?;
                Err(err)
            }
        }
    }

    pub async fn dispatch(&self, action: Action) -> Result<(), PanelError> {
        let label = action.as_str().to_string();
        let _busy = self.begin_action(&label)?;
        let outcome = self.guarded(self.dispatcher.dispatch(action)).await?;
        self.finish_action(&label, outcome)
    }

    pub async fn request_build(&self, profile: BuildProfile) -> Result<(), PanelError> {
        let label = format!("build {profile}");
        let _busy = self.begin_action(&label)?;
        let outcome = self.guarded(self.builds.request_build(profile)).await?;
        self.finish_action(&label, outcome)
    }

    /// Refreshes every `interval` until `shutdown` fires, handing the state
    /// to `on_cycle` after each attempt. Shutdown also abandons a refresh
    /// that is still in flight.
    pub async fn watch(
        &self,
        interval: Duration,
        shutdown: CancellationToken,
        mut on_cycle: impl FnMut(&PanelUiState),
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            let refreshed = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.refresh() => result,
            };
            if let Err(err) = refreshed {
                tracing::warn!(error = %err, "watch refresh failed");
            }
            on_cycle(&self.state());
        }
        tracing::debug!(service = %self.service(), "watch stopped");
    }

    /// Ends the panel lifetime. In-flight work is abandoned and nothing that
    /// completes afterwards touches the state.
    pub fn teardown(&self) {
        if !self.shared.lifetime.is_cancelled() {
            tracing::info!(service = %self.service(), "panel torn down");
        }
        self.shared.lifetime.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.lifetime.is_cancelled()
    }

    fn begin_action(&self, label: &str) -> Result<BusyGuard, PanelError> {
        self.shared.transition(|ui| match ui.phase() {
            PanelPhase::Idle | PanelPhase::Loading => Err(PanelError::NotReady),
            PanelPhase::Busy => Err(PanelError::Busy),
            PanelPhase::Ready => {
                ui.busy = true;
                ui.error = None;
                Ok(())
            }
        })?;
        self.shared.emit(PanelEvent::ActionStarted {
            action: label.to_string(),
        });
        Ok(BusyGuard {
            shared: Arc::clone(&self.shared),
        })
    }

    fn finish_action(
        &self,
        label: &str,
        outcome: Result<AggregateState, PanelError>,
    ) -> Result<(), PanelError> {
        let ok = outcome.is_ok();
        let result = match outcome {
            Ok(aggregate) => self.shared.update(|ui| {
                ui.busy = false;
                ui.replace_aggregate(aggregate);
            }),
            Err(err) => {
                self.shared.update(|ui| {
                    ui.busy = false;
                    ui.error = Some(PanelNotice::action(err.to_string()));
                })?;
                Err(err)
            }
        };
        self.shared.emit(PanelEvent::ActionFinished {
            action: label.to_string(),
            ok,
        });
        result
    }

    async fn guarded<F: Future>(&self, work: F) -> Result<F::Output, PanelError> {
        tokio::select! {
            _ = self.shared.lifetime.cancelled() => Err(PanelError::Detached),
            output = work => Ok(output),
        }
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        self.shared.lifetime.cancel();
    }
}
