//! Configuration (layered: defaults < config file < environment < code).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RunError;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_WAIT_MS: u64 = 600_000;
pub const DEFAULT_STREAM_IDLE_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_API_VERSION: &str = "2025-05-01";

const POLL_INTERVAL_ENV: &str = "AGENTRUN_POLL_INTERVAL_MS";
const REQUEST_TIMEOUT_ENV: &str = "AGENTRUN_REQUEST_TIMEOUT_MS";
const MAX_WAIT_ENV: &str = "AGENTRUN_MAX_WAIT_MS";
const STREAM_IDLE_TIMEOUT_ENV: &str = "AGENTRUN_STREAM_IDLE_TIMEOUT_MS";
const ENDPOINT_ENV: &str = "AGENTRUN_ENDPOINT";
const API_KEY_ENV: &str = "AGENTRUN_API_KEY";
const API_VERSION_ENV: &str = "AGENTRUN_API_VERSION";

/// Timing bounds for driving a run.
///
/// A bound of `0` disables it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Wait between two polls of the same run.
    pub poll_interval_ms: u64,
    /// Upper bound for each individual network operation.
    pub request_timeout_ms: u64,
    /// Upper bound for driving one run from creation to a terminal status.
    pub max_wait_ms: u64,
    /// Upper bound for waiting on the next stream event.
    pub stream_idle_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            stream_idle_timeout_ms: DEFAULT_STREAM_IDLE_TIMEOUT_MS,
        }
    }
}

impl OrchestratorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero(self.request_timeout_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        non_zero(self.max_wait_ms)
    }

    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        non_zero(self.stream_idle_timeout_ms)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = max_wait.as_millis() as u64;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Defaults, then the config file (explicit path or the platform default
    /// when it exists), then `AGENTRUN_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, RunError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let file = ConfigFile::load(path)?;
        file.orchestrator.apply_env(|key| std::env::var(key).ok())
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, RunError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            (POLL_INTERVAL_ENV, &mut self.poll_interval_ms),
            (REQUEST_TIMEOUT_ENV, &mut self.request_timeout_ms),
            (MAX_WAIT_ENV, &mut self.max_wait_ms),
            (STREAM_IDLE_TIMEOUT_ENV, &mut self.stream_idle_timeout_ms),
        ];
        for (key, field) in fields {
            if let Some(raw) = lookup(key) {
                *field = raw.trim().parse().map_err(|_| {
                    RunError::Configuration(format!("{key} must be a whole number of milliseconds, got '{raw}'"))
                })?;
            }
        }
        Ok(self)
    }
}

fn non_zero(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// On-disk configuration (`config.toml`).
///
/// ```toml
/// [orchestrator]
/// poll_interval_ms = 250
///
/// [client]
/// endpoint = "https://example.services.ai.azure.com/api/projects/demo"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub orchestrator: OrchestratorConfig,
    pub client: ClientSection,
}

/// Non-secret client settings; the API key only comes from the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub endpoint: Option<String>,
    pub api_version: Option<String>,
}

impl ConfigFile {
    /// Platform config location, e.g. `~/.config/agentrun/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "agentrun")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, RunError> {
        toml::from_str(raw).map_err(|e| RunError::Configuration(format!("invalid config file: {e}")))
    }

    /// Read `path`, or the default location if it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, RunError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        tracing::debug!(path = %path.display(), "loading config file");
        let raw = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&raw)
    }
}

/// Connection settings for [`crate::client::AgentsClient`].
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"..")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Config file client section, then `AGENTRUN_ENDPOINT`,
    /// `AGENTRUN_API_KEY` and `AGENTRUN_API_VERSION`.
    pub fn load(path: Option<&Path>) -> Result<Self, RunError> {
        let _ = dotenvy::dotenv();
        let file = ConfigFile::load(path)?;
        Self::resolve(&file.client, |key| std::env::var(key).ok())
    }

    /// Merge a file section with environment-style lookups.
    pub fn resolve<F>(section: &ClientSection, lookup: F) -> Result<Self, RunError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENDPOINT_ENV)
            .or_else(|| section.endpoint.clone())
            .ok_or_else(|| RunError::Configuration(format!("Missing {ENDPOINT_ENV}")))?;
        let api_key = lookup(API_KEY_ENV)
            .ok_or_else(|| RunError::Configuration(format!("Missing {API_KEY_ENV}")))?;
        let api_version = lookup(API_VERSION_ENV)
            .or_else(|| section.api_version.clone())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self::new(endpoint, api_key).with_api_version(api_version))
    }
}
