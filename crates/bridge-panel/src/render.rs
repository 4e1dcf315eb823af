use std::time::{Duration, UNIX_EPOCH};

use bridge_protocol::{
    BuildRecord, HealthStatus, IntegrationDescriptor, PlatformStatus, SyncStatus, SyncTimestamp,
};

use crate::controller::{NoticeKind, PanelPhase, PanelUiState};
use crate::lifecycle::{available_actions, can_build, lifecycle_stage};
use crate::status::{AggregateState, Snapshot};

const UNAVAILABLE: &str = "status unavailable";

pub fn platform_line(snapshot: &Snapshot<PlatformStatus>) -> String {
    match snapshot {
        Snapshot::Present(platform) if platform.available => match platform.version.as_deref() {
            Some(version) if !version.trim().is_empty() => format!("available (v{version})"),
            _ => "available".to_string(),
        },
        Snapshot::Present(_) => "not available".to_string(),
        Snapshot::Absent => UNAVAILABLE.to_string(),
    }
}

pub fn integration_line(snapshot: &Snapshot<IntegrationDescriptor>) -> String {
    match snapshot {
        Snapshot::Present(integration) if !integration.installed => "not installed".to_string(),
        Snapshot::Present(integration) => {
            let enabled = if integration.enabled { "enabled" } else { "disabled" };
            format!("installed, {enabled}")
        }
        Snapshot::Absent => UNAVAILABLE.to_string(),
    }
}

pub fn health_line(snapshot: &Snapshot<HealthStatus>) -> String {
    match snapshot {
        Snapshot::Present(health) if health.is_ok() => health.status.clone(),
        Snapshot::Present(health) => format!("{} (degraded)", health.status),
        Snapshot::Absent => "unknown".to_string(),
    }
}

pub fn sync_line(snapshot: &Snapshot<SyncStatus>) -> String {
    let sync = match snapshot {
        Snapshot::Present(sync) => sync,
        Snapshot::Absent => return UNAVAILABLE.to_string(),
    };
    if !sync.db_exists {
        return "no database".to_string();
    }
    let records = match sync.record_count {
        Some(1) => "1 record".to_string(),
        Some(count) => format!("{count} records"),
        None => "record count unknown".to_string(),
    };
    match sync.last_sync.as_ref() {
        Some(last) if !last.is_blank() => {
            format!("{records} (last sync {})", timestamp_text(last))
        }
        _ => format!("{records} (never synced)"),
    }
}

fn timestamp_text(timestamp: &SyncTimestamp) -> String {
    match timestamp {
        SyncTimestamp::Text(text) => text.trim().to_string(),
        SyncTimestamp::Epoch(secs) => {
            humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(*secs)).to_string()
        }
    }
}

pub fn build_line(record: &BuildRecord) -> String {
    let artifacts = if record.artifact_count == 1 {
        "1 artifact".to_string()
    } else {
        format!("{} artifacts", record.artifact_count)
    };
    format!(
        "{}  {}  {}  sha {}",
        record.build_id,
        record.profile,
        artifacts,
        record.bridge_sha_or_na()
    )
}

pub fn render_builds(snapshot: &Snapshot<Vec<BuildRecord>>) -> Vec<String> {
    match snapshot {
        Snapshot::Absent => vec!["build list unavailable".to_string()],
        Snapshot::Present(builds) if builds.is_empty() => vec!["No builds yet".to_string()],
        Snapshot::Present(builds) => builds.iter().map(build_line).collect(),
    }
}

fn phase_label(phase: PanelPhase) -> &'static str {
    match phase {
        PanelPhase::Idle => "idle",
        PanelPhase::Loading => "loading",
        PanelPhase::Ready => "ready",
        PanelPhase::Busy => "busy",
    }
}

fn render_aggregate(lines: &mut Vec<String>, aggregate: &AggregateState) {
    lines.push(format!("  platform     {}", platform_line(&aggregate.platform)));
    lines.push(format!("  integration  {}", integration_line(&aggregate.integration)));
    lines.push(format!("  health       {}", health_line(&aggregate.health)));
    lines.push(format!("  database     {}", sync_line(&aggregate.sync)));
    lines.push(format!("  stage        {}", lifecycle_stage(aggregate).as_str()));
    let actions: Vec<&str> = available_actions(aggregate)
        .iter()
        .map(|action| action.as_str())
        .collect();
    let mut actions = actions.join(", ");
    if can_build(aggregate) {
        if !actions.is_empty() {
            actions.push_str(", ");
        }
        actions.push_str("build");
    }
    if actions.is_empty() {
        actions.push('-');
    }
    lines.push(format!("  actions      {actions}"));
    lines.push("  builds".to_string());
    for line in render_builds(&aggregate.builds) {
        lines.push(format!("    {line}"));
    }
    lines.push(format!(
        "  refreshed    #{} at {}",
        aggregate.sequence,
        humantime::format_rfc3339_seconds(aggregate.refreshed_at)
    ));
}

/// Plain-text rendering of the whole panel. A blocking notice replaces the
/// content; an action notice is shown after the last-known status.
pub fn render_panel(state: &PanelUiState, service: &str) -> String {
    let phase = state.phase();
    let mut lines = vec![format!("{service} bridge [{}]", phase_label(phase))];
    match (&state.aggregate, &state.error) {
        (_, Some(notice)) if notice.kind == NoticeKind::Blocking => {
            lines.push(format!("  error: {}", notice.message));
        }
        (None, _) if phase == PanelPhase::Loading => lines.push("  loading status...".to_string()),
        (None, _) => lines.push("  no status yet".to_string()),
        (Some(aggregate), notice) => {
            render_aggregate(&mut lines, aggregate);
            if let Some(notice) = notice {
                lines.push(format!("  error: {}", notice.message));
            }
        }
    }
    lines.join("\n")
}
