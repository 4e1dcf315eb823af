//! Where the integration sits on installed → enabled → synced → built, and
//! which actions make sense from there. Advisory: the dispatcher accepts any
//! action, front ends use this to enable or disable triggers.

use serde::Serialize;

use crate::routes::Action;
use crate::status::{AggregateState, Snapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Unknown,
    NotInstalled,
    Installed,
    Enabled,
    Synced,
    Built,
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStage::Unknown => "unknown",
            LifecycleStage::NotInstalled => "not installed",
            LifecycleStage::Installed => "installed (disabled)",
            LifecycleStage::Enabled => "enabled",
            LifecycleStage::Synced => "synced",
            LifecycleStage::Built => "built",
        }
    }
}

pub fn lifecycle_stage(state: &AggregateState) -> LifecycleStage {
    let Some(integration) = state.integration.as_ref() else {
        return LifecycleStage::Unknown;
    };
    if !integration.installed {
        return LifecycleStage::NotInstalled;
    }
    if !integration.enabled {
        return LifecycleStage::Installed;
    }
    let synced = state
        .sync
        .as_ref()
        .map_or(false, |sync| sync.db_exists && sync.record_count.unwrap_or(0) > 0);
    if !synced {
        return LifecycleStage::Enabled;
    }
    match &state.builds {
        Snapshot::Present(builds) if !builds.is_empty() => LifecycleStage::Built,
        _ => LifecycleStage::Synced,
    }
}

pub fn available_actions(state: &AggregateState) -> Vec<Action> {
    let Some(integration) = state.integration.as_ref() else {
        return Vec::new();
    };
    if !integration.installed {
        return vec![Action::Install];
    }
    if !integration.enabled {
        return vec![Action::Enable, Action::Uninstall];
    }
    let mut actions = vec![
        Action::Disable,
        Action::Uninstall,
        Action::Sync,
        Action::Rescan,
        Action::Rebuild,
    ];
    if state.sync.as_ref().map_or(false, |sync| sync.db_exists) {
        actions.push(Action::Export);
    }
    actions
}

pub fn can_build(state: &AggregateState) -> bool {
    let platform_ready = state
        .platform
        .as_ref()
        .map_or(false, |platform| platform.available);
    let enabled = state
        .integration
        .as_ref()
        .map_or(false, |integration| integration.installed && integration.enabled);
    platform_ready && enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_protocol::{
        BuildRecord, HealthStatus, IntegrationDescriptor, PlatformStatus, SyncStatus,
    };
    use std::time::SystemTime;

    fn state(installed: bool, enabled: bool, records: u64, builds: usize) -> AggregateState {
        AggregateState {
            sequence: 1,
            refreshed_at: SystemTime::now(),
            platform: Snapshot::Present(PlatformStatus {
                available: true,
                version: Some("1.2.0".to_string()),
            }),
            integration: Snapshot::Present(IntegrationDescriptor {
                name: "sonic".to_string(),
                installed,
                enabled,
            }),
            health: Snapshot::Present(HealthStatus {
                status: "ok".to_string(),
            }),
            sync: Snapshot::Present(SyncStatus {
                db_exists: records > 0,
                record_count: Some(records),
                last_sync: None,
            }),
            builds: Snapshot::Present(
                (0..builds)
                    .map(|index| BuildRecord {
                        build_id: format!("b-{index}"),
                        profile: "alpine-core".to_string(),
                        artifact_count: 1,
                        bridge_sha: None,
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn stage_walks_the_lifecycle() {
        assert_eq!(lifecycle_stage(&state(false, false, 0, 0)), LifecycleStage::NotInstalled);
        assert_eq!(lifecycle_stage(&state(true, false, 0, 0)), LifecycleStage::Installed);
        assert_eq!(lifecycle_stage(&state(true, true, 0, 0)), LifecycleStage::Enabled);
        assert_eq!(lifecycle_stage(&state(true, true, 42, 0)), LifecycleStage::Synced);
        assert_eq!(lifecycle_stage(&state(true, true, 42, 2)), LifecycleStage::Built);
    }

    #[test]
    fn absent_integration_is_unknown_with_no_actions() {
        let mut aggregate = state(true, true, 42, 0);
        aggregate.integration = Snapshot::Absent;
        assert_eq!(lifecycle_stage(&aggregate), LifecycleStage::Unknown);
        assert!(available_actions(&aggregate).is_empty());
        assert!(!can_build(&aggregate));
    }

    #[test]
    fn export_needs_a_database() {
        assert!(!available_actions(&state(true, true, 0, 0)).contains(&Action::Export));
        assert!(available_actions(&state(true, true, 5, 0)).contains(&Action::Export));
    }

    #[test]
    fn build_needs_available_platform() {
        let mut aggregate = state(true, true, 1, 0);
        assert!(can_build(&aggregate));
        aggregate.platform = Snapshot::Present(PlatformStatus {
            available: false,
            version: None,
        });
        assert!(!can_build(&aggregate));
    }
}
