use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod config;

/// `GET /api/platform/<service>/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformStatus {
    pub available: bool,
    #[serde(default)]
    pub version: Option<String>,
}

/// `GET /api/library/integration/<service>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrationEnvelope {
    pub integration: IntegrationDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrationDescriptor {
    pub name: String,
    pub installed: bool,
    pub enabled: bool,
}

/// `GET /api/<service>/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(
            self.status.trim().to_ascii_lowercase().as_str(),
            "ok" | "healthy" | "up"
        )
    }
}

/// `GET /api/<service>/db/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    pub db_exists: bool,
    #[serde(default)]
    pub record_count: Option<u64>,
    #[serde(default)]
    pub last_sync: Option<SyncTimestamp>,
}

/// `last_sync` arrives either as a formatted string or as unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SyncTimestamp {
    Epoch(u64),
    Text(String),
}

impl SyncTimestamp {
    pub fn is_blank(&self) -> bool {
        matches!(self, SyncTimestamp::Text(text) if text.trim().is_empty())
    }
}

/// `GET /api/platform/<service>/builds`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildListPayload {
    pub builds: Vec<BuildEntry>,
}

/// One entry of the build list as the server sends it. The binary hash is
/// keyed by service name (`sonic_sha` for the `sonic` service), so unknown
/// keys are kept and resolved later with [`BuildEntry::bridge_sha`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildEntry {
    pub build_id: String,
    pub profile: String,
    #[serde(default)]
    pub artifact_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildEntry {
    pub fn bridge_sha(&self, service: &str) -> Option<&str> {
        self.extra
            .get(&format!("{service}_sha"))
            .and_then(Value::as_str)
            .filter(|sha| !sha.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildRecord {
    pub build_id: String,
    pub profile: String,
    pub artifact_count: u64,
    pub bridge_sha: Option<String>,
}

impl BuildRecord {
    pub fn from_entry(entry: BuildEntry, service: &str) -> Self {
        let bridge_sha = entry.bridge_sha(service).map(str::to_string);
        Self {
            build_id: entry.build_id,
            profile: entry.profile,
            artifact_count: entry.artifact_count,
            bridge_sha,
        }
    }

    pub fn bridge_sha_or_na(&self) -> &str {
        self.bridge_sha.as_deref().unwrap_or("n/a")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BuildProfile {
    #[serde(rename = "alpine-core")]
    AlpineCore,
    #[serde(rename = "alpine-core+sonic")]
    AlpineCoreSonic,
    #[serde(rename = "alpine-full+sonic")]
    AlpineFullSonic,
}

impl BuildProfile {
    pub const ALL: [BuildProfile; 3] = [
        BuildProfile::AlpineCore,
        BuildProfile::AlpineCoreSonic,
        BuildProfile::AlpineFullSonic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildProfile::AlpineCore => "alpine-core",
            BuildProfile::AlpineCoreSonic => "alpine-core+sonic",
            BuildProfile::AlpineFullSonic => "alpine-full+sonic",
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBuildProfile(pub String);

impl fmt::Display for UnknownBuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = BuildProfile::ALL.iter().map(BuildProfile::as_str).collect();
        write!(
            f,
            "unknown build profile {:?} (expected one of: {})",
            self.0,
            known.join(", ")
        )
    }
}

impl std::error::Error for UnknownBuildProfile {}

impl FromStr for BuildProfile {
    type Err = UnknownBuildProfile;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        BuildProfile::ALL
            .into_iter()
            .find(|profile| profile.as_str() == value)
            .ok_or_else(|| UnknownBuildProfile(value.to_string()))
    }
}
