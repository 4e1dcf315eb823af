use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bridge_protocol::{
    BuildListPayload, BuildRecord, HealthStatus, IntegrationDescriptor, IntegrationEnvelope,
    PlatformStatus, SyncStatus,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::BridgeClient;
use crate::error::PanelError;
use crate::routes::{RouteTable, SourceKind};

/// Result of one status read: the parsed payload, or `Absent` when the
/// source could not be read. `Absent` means "unknown", never zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Snapshot<T> {
    Present(T),
    Absent,
}

impl<T> Snapshot<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Snapshot::Present(_))
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Snapshot::Present(value) => Some(value),
            Snapshot::Absent => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Snapshot<U> {
        match self {
            Snapshot::Present(value) => Snapshot::Present(f(value)),
            Snapshot::Absent => Snapshot::Absent,
        }
    }
}

/// The five snapshots of one refresh cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateState {
    pub sequence: u64,
    pub refreshed_at: SystemTime,
    pub platform: Snapshot<PlatformStatus>,
    pub integration: Snapshot<IntegrationDescriptor>,
    pub health: Snapshot<HealthStatus>,
    pub sync: Snapshot<SyncStatus>,
    pub builds: Snapshot<Vec<BuildRecord>>,
}

impl AggregateState {
    /// Compares snapshot contents, ignoring the sequence number and time.
    pub fn same_values(&self, other: &AggregateState) -> bool {
        self.platform == other.platform
            && self.integration == other.integration
            && self.health == other.health
            && self.sync == other.sync
            && self.builds == other.builds
    }

    pub fn absent_sources(&self) -> Vec<SourceKind> {
        let flags = [
            (SourceKind::Platform, self.platform.is_present()),
            (SourceKind::Integration, self.integration.is_present()),
            (SourceKind::Health, self.health.is_present()),
            (SourceKind::Sync, self.sync.is_present()),
            (SourceKind::Builds, self.builds.is_present()),
        ];
        flags
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(kind, _)| kind)
            .collect()
    }
}

pub struct AggregateStatusView {
    client: BridgeClient,
    routes: Arc<RouteTable>,
    status_timeout: Option<Duration>,
    sequence: AtomicU64,
}

impl AggregateStatusView {
    pub fn new(
        client: BridgeClient,
        routes: Arc<RouteTable>,
        status_timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            routes,
            status_timeout,
            sequence: AtomicU64::new(0),
        }
    }

    /// Reads all five sources concurrently and returns once every one has
    /// settled. A failing source becomes `Absent`; only an error raised
    /// before any request is issued fails the whole cycle.
    pub async fn refresh_all(&self) -> Result<AggregateState, PanelError> {
        let bearer = self.client.authorization()?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(sequence, "status refresh started");

        let (platform, integration, health, sync, builds) = tokio::join!(
            self.fetch::<PlatformStatus>(SourceKind::Platform, bearer.clone()),
            self.fetch::<IntegrationEnvelope>(SourceKind::Integration, bearer.clone()),
            self.fetch::<HealthStatus>(SourceKind::Health, bearer.clone()),
            self.fetch::<SyncStatus>(SourceKind::Sync, bearer.clone()),
            self.fetch::<BuildListPayload>(SourceKind::Builds, bearer),
        );

        let service = self.routes.service();
        let state = AggregateState {
            sequence,
            refreshed_at: SystemTime::now(),
            platform,
            integration: integration.map(|envelope| envelope.integration),
            health,
            sync,
            builds: builds.map(|payload| {
                payload
                    .builds
                    .into_iter()
                    .map(|entry| BuildRecord::from_entry(entry, service))
                    .collect()
            }),
        };
        let absent: Vec<&str> = state
            .absent_sources()
            .iter()
            .map(SourceKind::as_str)
            .collect();
        tracing::info!(sequence, absent = ?absent, "status refresh settled");
        Ok(state)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        kind: SourceKind,
        bearer: Option<String>,
    ) -> Snapshot<T> {
        let route = self.routes.source(kind);
        match self
            .client
            .get_json::<T>(&route.path, bearer, self.status_timeout)
            .await
        {
            Ok(value) => Snapshot::Present(value),
            Err(err) => {
                tracing::warn!(source = kind.as_str(), error = %err, "status source unavailable");
                Snapshot::Absent
            }
        }
    }
}
