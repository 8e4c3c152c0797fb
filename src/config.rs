//! Client settings
//!
//! Settings are read once at startup: built-in defaults, then an optional
//! YAML file, then `NOTION_*` variables. A variable set in the process
//! environment wins over the same variable in a `.env` file. Nothing is
//! reloaded afterwards.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "NOTION_API_KEY";
/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "NOTION_API_BASE_URL";
/// Environment variable overriding the API version
pub const ENV_API_VERSION: &str = "NOTION_API_VERSION";
/// Environment variable overriding the per-call timeout (seconds)
pub const ENV_TIMEOUT: &str = "NOTION_HTTP_TIMEOUT";
/// Environment variable overriding the request rate
pub const ENV_REQUESTS_PER_SECOND: &str = "NOTION_RATE_LIMIT_REQUESTS_PER_SECOND";
/// Environment variable overriding the warning threshold
pub const ENV_WARNING_THRESHOLD: &str = "NOTION_RATE_LIMIT_WARNING_THRESHOLD";

// ============================================================================
// Settings
// ============================================================================

/// Complete client settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Integration token
    pub api_key: String,

    /// Base URL for API requests
    pub base_url: String,

    /// Value sent in the `Notion-Version` header
    pub api_version: String,

    /// Per-call timeout in seconds
    pub timeout_secs: f64,

    /// Rate budget
    pub rate_limit: RateLimitSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30.0,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

/// Rate budget as written in settings files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Maximum sustained requests per second
    pub requests_per_second: f64,

    /// Fraction of the limit at which to warn
    pub warning_threshold: f64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let defaults = RateLimiterConfig::default();
        Self {
            requests_per_second: defaults.requests_per_second,
            warning_threshold: defaults.warning_threshold,
        }
    }
}

impl From<RateLimitSettings> for RateLimiterConfig {
    fn from(settings: RateLimitSettings) -> Self {
        RateLimiterConfig::new(settings.requests_per_second, settings.warning_threshold)
    }
}

impl Settings {
    /// Load settings from an optional YAML file, a `.env` file found in the
    /// working directory or its parents, and the process environment, then
    /// validate them
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_file = match dotenvy::dotenv_iter() {
            Ok(iter) => collect_env_file(iter)?,
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => return Err(Error::config(format!("Failed to read .env file: {e}"))),
        };
        Self::load_with_env_file(path, &env_file)
    }

    /// Like [`Settings::load`], with `.env` values supplied by the caller
    pub fn load_with_env_file(
        path: Option<&Path>,
        env_file: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(layered_lookup(|key| std::env::var(key).ok(), env_file))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read `KEY=value` pairs from a dotenv file without touching the
    /// process environment
    pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            Error::config(format!("Failed to read env file {}: {e}", path.display()))
        })?;
        collect_env_file(iter)
    }

    /// Parse settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply `NOTION_*` overrides from `lookup`.
    ///
    /// Blank values are ignored so an exported-but-empty variable does not
    /// wipe a value from the settings file.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(version) = get(ENV_API_VERSION) {
            self.api_version = version;
        }
        if let Some(raw) = get(ENV_TIMEOUT) {
            self.timeout_secs = parse_number(ENV_TIMEOUT, &raw)?;
        }
        if let Some(raw) = get(ENV_REQUESTS_PER_SECOND) {
            self.rate_limit.requests_per_second = parse_number(ENV_REQUESTS_PER_SECOND, &raw)?;
        }
        if let Some(raw) = get(ENV_WARNING_THRESHOLD) {
            self.rate_limit.warning_threshold = parse_number(ENV_WARNING_THRESHOLD, &raw)?;
        }
        Ok(())
    }

    /// Check that the settings can build a working client
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::missing_field("api_key"));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.api_version.trim().is_empty() {
            return Err(Error::missing_field("api_version"));
        }

        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(Error::invalid_value(
                "timeout_secs",
                format!("must be a positive number, got {}", self.timeout_secs),
            ));
        }

        RateLimiterConfig::from(self.rate_limit).validate()
    }

    /// Convert into the HTTP client configuration
    pub fn to_http_config(&self) -> Result<HttpClientConfig> {
        let timeout = Duration::try_from_secs_f64(self.timeout_secs)
            .map_err(|e| Error::invalid_value("timeout_secs", e.to_string()))?;

        Ok(HttpClientConfig::builder()
            .base_url(self.base_url.clone())
            .api_key(self.api_key.clone())
            .api_version(self.api_version.clone())
            .timeout(timeout)
            .rate_limit(self.rate_limit.into())
            .build())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

fn collect_env_file<R: std::io::Read>(iter: dotenvy::Iter<R>) -> Result<HashMap<String, String>> {
    iter.map(|item| item.map_err(|e| Error::config(format!("Invalid .env entry: {e}"))))
        .collect()
}

/// Process values first, `.env` values for anything unset or blank
fn layered_lookup<'a, P>(
    process: P,
    env_file: &'a HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + 'a
where
    P: Fn(&str) -> Option<String> + 'a,
{
    move |key| {
        process(key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_file.get(key).cloned())
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_value(field, format!("expected a number, got '{raw}'")))
}
