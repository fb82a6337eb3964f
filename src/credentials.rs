//! Bearer token lookup per GitHub host.

use std::collections::HashMap;

use crate::config::RelayToml;
use crate::errors::WorkflowError;
use crate::github::token::{has_known_token_prefix, redact};

/// Environment variables checked for a token, highest priority first.
pub const TOKEN_ENV_VARS: &[&str] = &["WFRELAY_GITHUB_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"];

/// Yields the bearer token for a host.
pub trait CredentialSource: Send + Sync {
    fn token_for(&self, host: &str) -> Result<String, WorkflowError>;
}

/// Fixed host -> token map.
#[derive(Default, Clone)]
pub struct StaticCredentials {
    tokens: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, host: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens
            .insert(host.into().to_ascii_lowercase(), token.into());
        self
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut hosts: Vec<&String> = self.tokens.keys().collect();
        hosts.sort();
        f.debug_struct("StaticCredentials")
            .field("hosts", &hosts)
            .finish()
    }
}

impl CredentialSource for StaticCredentials {
    fn token_for(&self, host: &str) -> Result<String, WorkflowError> {
        self.tokens
            .get(&host.to_ascii_lowercase())
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .map(checked)
            .ok_or_else(|| WorkflowError::MissingToken {
                host: host.to_string(),
            })
    }
}

/// Reads the first non-empty variable of [`TOKEN_ENV_VARS`]. Host agnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl EnvCredentials {
    fn lookup<F>(lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        TOKEN_ENV_VARS
            .iter()
            .filter_map(|var| lookup(var))
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
    }
}

impl CredentialSource for EnvCredentials {
    fn token_for(&self, host: &str) -> Result<String, WorkflowError> {
        Self::lookup(|var| std::env::var(var).ok())
            .map(checked)
            .ok_or_else(|| WorkflowError::MissingToken {
                host: host.to_string(),
            })
    }
}

/// `[[integrations.github]]` entries first, then the environment.
#[derive(Debug, Clone)]
pub struct ConfigCredentials {
    configured: StaticCredentials,
}

impl ConfigCredentials {
    pub fn from_toml(toml: &RelayToml) -> Self {
        let configured = toml
            .integrations
            .github
            .iter()
            .fold(StaticCredentials::new(), |creds, entry| {
                creds.with_token(entry.host.clone(), entry.token.clone())
            });
        Self { configured }
    }
}

impl CredentialSource for ConfigCredentials {
    fn token_for(&self, host: &str) -> Result<String, WorkflowError> {
        match self.configured.token_for(host) {
            Ok(token) => Ok(token),
            Err(WorkflowError::MissingToken { .. }) => {
                tracing::debug!(host, "No configured token, falling back to environment");
                EnvCredentials.token_for(host)
            }
            Err(e) => Err(e),
        }
    }
}

/// Unknown formats still get used; GitHub Enterprise may issue other shapes.
fn checked(token: String) -> String {
    if !has_known_token_prefix(&token) {
        tracing::warn!(
            token = %redact(&token),
            "Token does not match a known GitHub token prefix"
        );
    }
    token
}
