//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use topcontrib_core::HttpConfig;
use topcontrib_github::{GITHUB_API, SearchConfig, config::DEFAULT_MAX_THROTTLE_RETRIES};

/// Global configuration for topcontrib
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    /// Literal token or `${VAR}`; unset or empty falls back to `GITHUB_TOKEN`
    #[serde(deserialize_with = "deserialize_token")]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API.to_string(),
            token: resolve_token(None, TOKEN_ENV),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Seconds
    pub connect_timeout: u64,
    /// Seconds, whole request including body
    pub request_timeout: u64,
    pub max_throttle_retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            connect_timeout: http.connect_timeout.as_secs(),
            request_timeout: http.request_timeout.as_secs(),
            max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
        }
    }
}

impl HttpSettings {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.request_timeout),
            ..HttpConfig::default()
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_throttle_retries: self.max_throttle_retries,
            ..SearchConfig::default()
        }
    }
}

/// Environment variable consulted when the config names no usable token
const TOKEN_ENV: &str = "GITHUB_TOKEN";

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(resolve_token(raw.as_deref(), TOKEN_ENV))
}

fn env_token(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|t| !t.trim().is_empty())
}

/// Token from the config value, else from `fallback_var`.
///
/// `${VAR}` reads `VAR`; anything else is taken literally. A blank value or
/// an unset variable counts as no token.
fn resolve_token(raw: Option<&str>, fallback_var: &str) -> Option<String> {
    let configured = raw.map(str::trim).filter(|t| !t.is_empty()).and_then(|t| {
        match t.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
            Some(var) => env_token(var),
            None => Some(t.to_string()),
        }
    });
    configured.or_else(|| env_token(fallback_var))
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./topcontrib.toml (current directory)
    /// 2. ~/.config/topcontrib/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("topcontrib.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "topcontrib") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
