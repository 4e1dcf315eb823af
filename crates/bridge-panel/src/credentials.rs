//! Bearer-token sources handed to the panel at construction.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("token variable {0} is not set")]
    MissingEnv(String),
}

pub trait CredentialProvider: Send + Sync {
    /// `Ok(None)` means requests go out without an `Authorization` header.
    fn bearer_token(&self) -> Result<Option<String>, CredentialError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Result<Option<String>, CredentialError> {
        Ok(None)
    }
}

#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Result<Option<String>, CredentialError> {
        let token = self.0.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }
}

/// Reads the token from an environment variable on every request, so a
/// rotated token is picked up without rebuilding the panel.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvToken {
    fn bearer_token(&self) -> Result<Option<String>, CredentialError> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value.trim().to_string())),
            _ => Err(CredentialError::MissingEnv(self.var.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token_trims_and_skips_empty() {
        assert_eq!(
            StaticToken::new(" abc ").bearer_token(),
            Ok(Some("abc".to_string()))
        );
        assert_eq!(StaticToken::new("  ").bearer_token(), Ok(None));
    }

    #[test]
    fn env_token_reports_missing_variable() {
        let provider = EnvToken::new("BRIDGE_PANEL_TEST_TOKEN_UNSET");
        assert_eq!(
            provider.bearer_token(),
            Err(CredentialError::MissingEnv(
                "BRIDGE_PANEL_TEST_TOKEN_UNSET".to_string()
            ))
        );
    }

    #[test]
    fn static_token_debug_is_redacted() {
        let debug = format!("{:?}", StaticToken::new("secret"));
        assert!(!debug.contains("secret"));
    }
}
