use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PanelConfig {
    pub base_url: Option<String>,
    pub service: Option<String>,
    pub timeouts: Option<TimeoutConfig>,
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimeoutConfig {
    pub connect_secs: Option<u64>,
    pub build_secs: Option<u64>,
    pub status_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    pub token_env: Option<String>,
    pub token: Option<String>,
}
