//! Configuration system (layered: defaults < TOML file < env < explicit overrides).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentConfig, DEFAULT_COMPLETION_TOOL};
use crate::error::SleuthError;
use crate::types::GenerationSettings;
use crate::util::cache::ResponseCache;
use crate::util::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Backoff settings as they appear in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            multiplier: policy.multiplier,
            jitter: policy.jitter,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            multiplier: settings.multiplier,
            jitter: settings.jitter,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Backing file; defaults to the platform cache directory.
    pub path: Option<PathBuf>,
    pub max_entries: Option<usize>,
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_entries: None,
            ttl_secs: None,
        }
    }
}

/// Resolved configuration for a sleuth process.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleuthConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_steps: usize,
    pub completion_tool: String,
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
    pub cache: CacheSettings,
}

impl Default for SleuthConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_steps: 20,
            completion_tool: DEFAULT_COMPLETION_TOOL.to_string(),
            request_timeout_secs: 120,
            retry: RetrySettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl fmt::Debug for SleuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SleuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_steps", &self.max_steps)
            .field("completion_tool", &self.completion_tool)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .finish()
    }
}

impl SleuthConfig {
    /// Load defaults, then the config file (if any), then the environment.
    pub fn load() -> Result<Self, SleuthError> {
        Self::load_from(None)
    }

    /// Like [`Self::load`], but an explicit `path` must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, SleuthError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let mut config = match path {
            Some(path) if !path.exists() => {
                return Err(SleuthError::Configuration(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// `$SLEUTH_CONFIG`, or `<config dir>/sleuth/config.toml`.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SLEUTH_CONFIG") {
            return Some(PathBuf::from(path));
        }
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("sleuth").join("config.toml"))
    }

    /// Parse a TOML config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, SleuthError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            SleuthError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), SleuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(model) = non_empty("SLEUTH_MODEL") {
            self.model = model;
        }
        if let Some(steps) = non_empty("SLEUTH_MAX_STEPS") {
            self.max_steps = steps.trim().parse().map_err(|_| {
                SleuthError::Configuration(format!("SLEUTH_MAX_STEPS is not a number: {steps}"))
            })?;
        }
        if let Some(path) = non_empty("SLEUTH_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// The API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, SleuthError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SleuthError::Configuration("OPENAI_API_KEY is not set".into()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings::builder().temperature(self.temperature).build()
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::builder()
            .model(self.model.clone())
            .max_steps(self.max_steps)
            .completion_tool(self.completion_tool.clone())
            .settings(self.generation_settings())
            .build()
    }

    /// Cache file location: configured path or the platform cache directory.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache.path.clone().or_else(|| {
            directories::BaseDirs::new()
                .map(|dirs| dirs.cache_dir().join("sleuth").join("responses.json"))
        })
    }

    /// Open the response cache when enabled.
    pub fn open_cache(&self) -> Result<Option<ResponseCache>, SleuthError> {
        if !self.cache.enabled {
            return Ok(None);
        }
        let ttl = self.cache.ttl_secs.map(Duration::from_secs);
        match self.cache_path() {
            Some(path) => ResponseCache::open(path, self.cache.max_entries, ttl).map(Some),
            None => Ok(Some(ResponseCache::new(self.cache.max_entries, ttl))),
        }
    }
}
