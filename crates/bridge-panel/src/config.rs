use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
pub use bridge_protocol::config::PanelConfig;

use crate::controller::{PanelOptions, DEFAULT_SERVICE};
use crate::credentials::{CredentialProvider, EnvToken, NoCredentials, StaticToken};
use crate::routes::RouteTable;
use crate::transport::join_base_path;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 2;
const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    None,
    Static(String),
    Env(String),
}

impl CredentialSource {
    pub fn provider(&self) -> Arc<dyn CredentialProvider> {
        match self {
            CredentialSource::None => Arc::new(NoCredentials),
            CredentialSource::Static(token) => Arc::new(StaticToken::new(token.clone())),
            CredentialSource::Env(var) => Arc::new(EnvToken::new(var.clone())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PanelSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub credentials: CredentialSource,
    pub options: PanelOptions,
}

#[derive(Clone, Debug, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub service: Option<String>,
}

pub fn load_panel_config(path: &Path) -> anyhow::Result<PanelConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: PanelConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// A missing file is fine when the base URL comes from the command line.
pub fn load_panel_config_or_default(
    path: &Path,
    overrides: &SettingsOverrides,
) -> anyhow::Result<PanelConfig> {
    if !path.exists() && overrides.base_url.is_some() {
        tracing::debug!(config = %path.display(), "config file missing, using defaults");
        return Ok(PanelConfig::default());
    }
    load_panel_config(path)
}

pub fn resolve_settings(
    config: PanelConfig,
    overrides: &SettingsOverrides,
) -> anyhow::Result<PanelSettings> {
    let base_url = overrides
        .base_url
        .clone()
        .or(config.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        .trim()
        .to_string();
    join_base_path(&base_url, "/").map_err(|err| anyhow::anyhow!("invalid base_url: {err}"))?;

    let service = overrides
        .service
        .clone()
        .or(config.service)
        .unwrap_or_else(|| DEFAULT_SERVICE.to_string())
        .trim()
        .to_string();
    RouteTable::new(&service).context("invalid service")?;

    let timeouts = config.timeouts.unwrap_or_default();
    let connect_secs = timeouts
        .connect_secs
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
    let build_secs = timeouts.build_secs.unwrap_or(DEFAULT_BUILD_TIMEOUT_SECS);
    if connect_secs == 0 {
        anyhow::bail!("timeouts.connect_secs must be greater than zero");
    }
    if build_secs == 0 {
        anyhow::bail!("timeouts.build_secs must be greater than zero");
    }
    let status_timeout = match timeouts.status_secs {
        Some(0) => anyhow::bail!("timeouts.status_secs must be greater than zero"),
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };

    let auth = config.auth.unwrap_or_default();
    let credentials = match (auth.token, auth.token_env) {
        (Some(_), Some(_)) => {
            anyhow::bail!("auth.token and auth.token_env are mutually exclusive")
        }
        (Some(token), None) => CredentialSource::Static(token),
        (None, Some(var)) if var.trim().is_empty() => {
            anyhow::bail!("auth.token_env cannot be empty")
        }
        (None, Some(var)) => CredentialSource::Env(var.trim().to_string()),
        (None, None) => CredentialSource::None,
    };

    Ok(PanelSettings {
        base_url,
        connect_timeout: Duration::from_secs(connect_secs),
        credentials,
        options: PanelOptions {
            service,
            build_timeout: Duration::from_secs(build_secs),
            status_timeout,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> PanelConfig {
        toml::from_str(input).unwrap()
    }

    #[test]
    fn defaults_apply_to_empty_config() {
        let settings = resolve_settings(parse(""), &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.options.service, "sonic");
        assert_eq!(settings.options.build_timeout, Duration::from_secs(120));
        assert_eq!(settings.options.status_timeout, None);
        assert_eq!(settings.credentials, CredentialSource::None);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = parse(
            r#"
base_url = "http://10.0.0.5:9000"
service = "sonic"
"#,
        );
        let overrides = SettingsOverrides {
            base_url: Some("https://panel.example".to_string()),
            service: Some("other".to_string()),
        };
        let settings = resolve_settings(config, &overrides).unwrap();
        assert_eq!(settings.base_url, "https://panel.example");
        assert_eq!(settings.options.service, "other");
    }

    #[test]
    fn rejects_schemeless_base_url() {
        let config = parse(r#"base_url = "127.0.0.1:8080""#);
        assert!(resolve_settings(config, &SettingsOverrides::default()).is_err());
    }

    #[test]
    fn rejects_bad_service_name() {
        let config = parse(r#"service = "so nic""#);
        assert!(resolve_settings(config, &SettingsOverrides::default()).is_err());
    }

    #[test]
    fn rejects_zero_timeouts() {
        let config = parse(
            r#"
[timeouts]
build_secs = 0
"#,
        );
        assert!(resolve_settings(config, &SettingsOverrides::default()).is_err());
    }

    #[test]
    fn token_sources_are_exclusive() {
        let config = parse(
            r#"
[auth]
token = "abc"
token_env = "BRIDGE_PANEL_TOKEN"
"#,
        );
        assert!(resolve_settings(config, &SettingsOverrides::default()).is_err());

        let config = parse(
            r#"
[auth]
token_env = "BRIDGE_PANEL_TOKEN"
"#,
        );
        let settings = resolve_settings(config, &SettingsOverrides::default()).unwrap();
        assert_eq!(
            settings.credentials,
            CredentialSource::Env("BRIDGE_PANEL_TOKEN".to_string())
        );
    }

    #[test]
    fn missing_file_needs_base_url_override() {
        let path = Path::new("/nonexistent/bridge-panel.toml");
        assert!(load_panel_config_or_default(path, &SettingsOverrides::default()).is_err());
        let overrides = SettingsOverrides {
            base_url: Some("http://127.0.0.1:1".to_string()),
            service: None,
        };
        assert!(load_panel_config_or_default(path, &overrides).is_ok());
    }
}
