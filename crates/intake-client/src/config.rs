use std::time::Duration;

use intake_spec::BackendError;
use reqwest::Url;

pub const API_URL_VAR: &str = "INTAKE_API_URL";
/// Alternate base URL used when the client runs inside docker compose.
pub const API_URL_DOCKER_VAR: &str = "INTAKE_API_URL_FOR_DOCKER";
pub const API_VERSION_VAR: &str = "INTAKE_API_VERSION";
pub const TIMEOUT_VAR: &str = "INTAKE_HTTP_TIMEOUT_SECS";

pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the intake backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, BackendError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = read(API_URL_VAR)
            .or_else(|| read(API_URL_DOCKER_VAR))
            .ok_or_else(|| {
                BackendError::config(format!(
                    "set {} (or {}) to the backend base URL",
                    API_URL_VAR, API_URL_DOCKER_VAR
                ))
            })?;

        let mut config = Self::new(api_url);
        if let Some(version) = read(API_VERSION_VAR) {
            config.api_version = version;
        }
        if let Some(raw) = read(TIMEOUT_VAR) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                BackendError::config(format!("{} must be a whole number of seconds", TIMEOUT_VAR))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// `{api_url}/{api_version}` as a URL all endpoints are joined onto.
    pub fn base_url(&self) -> Result<Url, BackendError> {
        let mut url = Url::parse(self.api_url.trim()).map_err(|err| {
            BackendError::config(format!("invalid api url '{}': {}", self.api_url, err))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                BackendError::config(format!("api url '{}' cannot carry a path", self.api_url))
            })?;
            segments.pop_if_empty();
            let version = self.api_version.trim_matches('/');
            if !version.is_empty() {
                segments.extend(version.split('/'));
            }
        }
        Ok(url)
    }
}
