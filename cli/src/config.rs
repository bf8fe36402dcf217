//! Configuration management for the kahani CLI.
//!
//! Configuration is stored in ~/.kahani/{app_name}/config.yaml and holds any
//! number of named contexts, one of which is current.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context as _;
use kahani_voice::{PipelineConfig, SweepMode};
use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".kahani";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Environment variable consulted when no context provides an API key.
pub const API_KEY_ENV: &str = "SARVAM_API_KEY";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub contexts: HashMap<String, Context>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// A single API context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    /// Context name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Sarvam API subscription key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// API base URL (optional, uses default if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// Request timeout in seconds (optional).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: u64,

    /// Maximum number of retries (optional).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_retries: u64,

    /// Voice used for lines that name none (optional).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_voice: String,

    /// Pipeline settings such as `workers` or `temp_dir`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        if self.current_context.is_empty() {
            self.current_context = name.to_string();
        }
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    /// Gets the current context.
    pub fn current(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the context by name, or the current context if no name is given.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.contexts.get(n),
            _ => self.current(),
        }
    }

    /// Lists all context names, sorted.
    pub fn list_contexts(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.contexts.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Context {
    /// Gets an extra value.
    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Sets an extra value.
    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Returns the context's API key, or the `SARVAM_API_KEY` environment
    /// variable when the context has none.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }

    /// Builds the pipeline configuration from this context's settings.
    ///
    /// Unset keys keep their defaults; malformed values are errors.
    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut cfg = PipelineConfig::default();

        if let Some(v) = self.parse_extra::<usize>("workers")? {
            cfg.workers = v;
        }
        if let Some(v) = self.get_extra("temp_dir") {
            cfg.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = self.get_extra("output_dir") {
            cfg.output_dir = PathBuf::from(v);
        }
        if let Some(v) = self.get_extra("audio_extension") {
            cfg.audio_extension = v.trim_start_matches('.').to_string();
        }
        if let Some(v) = self.get_extra("ffmpeg") {
            cfg.ffmpeg = Some(PathBuf::from(v));
        }
        if let Some(v) = self.parse_extra::<f64>("min_success_ratio")? {
            if !(0.0..=1.0).contains(&v) {
                anyhow::bail!("min_success_ratio must be between 0 and 1, got {}", v);
            }
            cfg.min_success_ratio = v;
        }
        if let Some(v) = self.parse_extra::<u64>("call_timeout")? {
            cfg.call_timeout_secs = v;
        }
        if let Some(v) = self.parse_extra::<u64>("deadline")? {
            cfg.deadline_secs = v;
        }
        if let Some(v) = self.get_extra("cleanup") {
            cfg.cleanup = match v {
                "live" => SweepMode::Live,
                "dry_run" | "dry-run" => SweepMode::DryRun,
                other => anyhow::bail!("cleanup must be 'live' or 'dry_run', got '{}'", other),
            };
        }
        if !self.default_voice.is_empty() {
            cfg.default_speaker = Some(self.default_voice.clone());
        }

        Ok(cfg)
    }

    fn parse_extra<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.get_extra(key)
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .with_context(|| format!("invalid value '{}' for '{}'", v, key))
            })
            .transpose()
    }
}

/// Loads configuration for the specified app, creating an empty file if
/// none exists.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}

/// Masks the API key for display.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
