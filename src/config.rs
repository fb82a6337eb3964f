//! Configuration read from `.wfrelay/wfrelay.toml`.
//!
//! Settings are layered file -> environment -> CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [github]
//! host = "github.com"
//! api_url = "https://api.github.com"   # optional, derived from host otherwise
//! correlation_input = "correlation_id"
//!
//! [polling]
//! resolve_attempts = 12
//! resolve_interval_secs = 5
//! monitor_interval_secs = 5
//! max_duration_secs = 3600             # optional, no ceiling when absent
//!
//! [[integrations.github]]
//! host = "github.com"
//! token = "ghp_..."
//! ```
//!
//! Environment overrides: `WFRELAY_API_URL`, `WFRELAY_POLL_INTERVAL_SECS`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialSource;
use crate::engine::orchestrator::{DEFAULT_CORRELATION_INPUT, DEFAULT_MONITOR_INTERVAL};
use crate::engine::resolver::{DEFAULT_RESOLVE_ATTEMPTS, DEFAULT_RESOLVE_INTERVAL};
use crate::engine::{EngineConfig, Orchestrator, ResolvePolicy, SystemClock};
use crate::errors::WorkflowError;
use crate::github::repo::repo_url_host;
use crate::github::token::has_known_token_prefix;
use crate::github::{GitHubClient, api_url_for_host};

pub const CONFIG_DIR: &str = ".wfrelay";
pub const CONFIG_FILE: &str = "wfrelay.toml";

pub const ENV_API_URL: &str = "WFRELAY_API_URL";
pub const ENV_POLL_INTERVAL: &str = "WFRELAY_POLL_INTERVAL_SECS";

const DEFAULT_HOST: &str = "github.com";

/// `[github]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSection {
    #[serde(default = "default_host")]
    pub host: String,
    /// Explicit REST base URL; wins over the one derived from `host`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Workflow input that receives the correlation token.
    #[serde(default = "default_correlation_input")]
    pub correlation_input: String,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_correlation_input() -> String {
    DEFAULT_CORRELATION_INPUT.to_string()
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_url: None,
            correlation_input: default_correlation_input(),
        }
    }
}

/// `[polling]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingSection {
    #[serde(default = "default_resolve_attempts")]
    pub resolve_attempts: u32,
    #[serde(default = "default_resolve_interval_secs")]
    pub resolve_interval_secs: u64,
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
    /// Overall ceiling for one call. No ceiling when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_secs: Option<u64>,
}

fn default_resolve_attempts() -> u32 {
    DEFAULT_RESOLVE_ATTEMPTS
}

fn default_resolve_interval_secs() -> u64 {
    DEFAULT_RESOLVE_INTERVAL.as_secs()
}

fn default_monitor_interval_secs() -> u64 {
    DEFAULT_MONITOR_INTERVAL.as_secs()
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            resolve_attempts: default_resolve_attempts(),
            resolve_interval_secs: default_resolve_interval_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
            max_duration_secs: None,
        }
    }
}

/// One `[[integrations.github]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubIntegration {
    #[serde(default = "default_host")]
    pub host: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationsSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub github: Vec<GithubIntegration>,
}

/// The complete wfrelay.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayToml {
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub integrations: IntegrationsSection,
}

impl RelayToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse wfrelay.toml")
    }

    /// Load `wfrelay.toml` from `config_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize wfrelay.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.github.api_url = Some(url.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.polling.monitor_interval_secs = secs,
                Err(_) => tracing::warn!(
                    var = ENV_POLL_INTERVAL,
                    value = %raw,
                    "Ignoring non-numeric poll interval"
                ),
            }
        }
    }

    /// REST base URL: explicit `api_url`, else derived from `host`.
    pub fn api_url(&self) -> String {
        match &self.github.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => api_url_for_host(&self.github.host),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            resolve: ResolvePolicy {
                max_attempts: self.polling.resolve_attempts,
                interval: Duration::from_secs(self.polling.resolve_interval_secs),
            },
            monitor_interval: Duration::from_secs(self.polling.monitor_interval_secs),
            correlation_input: self.github.correlation_input.clone(),
        }
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.polling
            .max_duration_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Token configured for `host`, if any.
    pub fn token_for(&self, host: &str) -> Option<&str> {
        self.integrations
            .github
            .iter()
            .find(|i| i.host.eq_ignore_ascii_case(host))
            .map(|i| i.token.as_str())
    }

    /// Validate the configuration and return any warnings.
    /// Refuse repository URLs that name a different host than the one
    /// requests (and tokens) go to. Plain `owner/repo` always passes.
    pub fn check_repo_host(&self, repo: &str) -> Result<(), WorkflowError> {
        let Some(url_host) = repo_url_host(repo) else {
            return Ok(());
        };
        let url_host = url_host.strip_prefix("www.").unwrap_or(&url_host);
        let configured = self.github.host.trim().trim_end_matches('/').to_ascii_lowercase();
        let configured = match configured.as_str() {
            "" | "api.github.com" => "github.com",
            other => other,
        };
        if url_host == configured {
            Ok(())
        } else {
            Err(WorkflowError::InvalidRequest(format!(
                "repository URL points at {} but github.host is {}",
                url_host, configured
            )))
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.polling.resolve_attempts == 0 {
            warnings.push(
                "polling.resolve_attempts is 0: runs can never be resolved".to_string(),
            );
        }
        if self.polling.resolve_interval_secs == 0 {
            warnings.push(
                "polling.resolve_interval_secs is 0: the run listing will be polled without delay"
                    .to_string(),
            );
        }
        if self.polling.monitor_interval_secs == 0 {
            warnings.push(
                "polling.monitor_interval_secs is 0: run status will be polled without delay"
                    .to_string(),
            );
        }
        if self.polling.max_duration_secs == Some(0) {
            warnings.push("polling.max_duration_secs is 0 and will be ignored".to_string());
        }
        if self.github.correlation_input.trim().is_empty() {
            warnings.push("github.correlation_input must not be empty".to_string());
        }
        if let Some(ref url) = self.github.api_url
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            warnings.push(format!("Invalid github.api_url '{}': expected an http(s) URL", url));
        }

        for integration in &self.integrations.github {
            if integration.token.trim().is_empty() {
                warnings.push(format!(
                    "Empty token in integrations.github for host '{}'",
                    integration.host
                ));
            } else if !has_known_token_prefix(&integration.token) {
                warnings.push(format!(
                    "Token for host '{}' does not look like a GitHub token",
                    integration.host
                ));
            }
        }

        warnings
    }
}

/// Configuration for one CLI invocation: the parsed file with environment
/// and CLI overrides applied.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub project_dir: PathBuf,
    pub config_dir: PathBuf,
    pub toml: RelayToml,
    pub verbose: bool,
}

impl RelayConfig {
    /// Load from `project_dir/.wfrelay/wfrelay.toml` with env overrides.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let mut toml = RelayToml::load_or_default(&config_dir)?;
        toml.apply_env(|key| std::env::var(key).ok());

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            verbose: false,
        })
    }

    pub fn with_cli_args(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn host(&self) -> &str {
        &self.toml.github.host
    }

    pub fn api_url(&self) -> String {
        self.toml.api_url()
    }

    pub fn engine_config(&self) -> EngineConfig {
        self.toml.engine_config()
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.toml.max_duration()
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }

    pub fn check_repo_host(&self, repo: &str) -> Result<(), WorkflowError> {
        self.toml.check_repo_host(repo)
    }

    /// Build an `Orchestrator` talking to the configured GitHub host.
    pub fn connect(&self, credentials: &dyn CredentialSource) -> Result<Orchestrator, WorkflowError> {
        let token = credentials.token_for(self.host())?;
        let client = GitHubClient::new(self.api_url(), token)
            .map_err(|e| WorkflowError::Config(format!("Failed to build HTTP client: {}", e)))?;
        tracing::debug!(api_url = client.api_url(), "Using GitHub API");
        Ok(Orchestrator::new(
            Arc::new(client),
            Arc::new(SystemClock),
            self.engine_config(),
        ))
    }
}
