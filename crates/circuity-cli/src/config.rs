//! CLI configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use circuity_core::SearchConfig;
use serde::{Deserialize, Serialize};

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("circuity")
        .join("config.toml")
}

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("circuity")
}

/// Configuration for the CLI, stored as TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the node database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Search tunables
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn keys() -> &'static [&'static str] {
        &[
            "data_dir",
            "search.step_limit",
            "search.verify_ceiling",
            "search.policy",
            "search.tries",
            "search.seed",
            "search.timeout_ms",
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let search = &self.search;
        let value = match key {
            "data_dir" => self.data_dir.as_ref().map(|p| p.display().to_string()),
            "search.step_limit" => Some(search.step_limit.to_string()),
            "search.verify_ceiling" => Some(search.verify_ceiling.to_string()),
            "search.policy" => Some(search.policy.to_string()),
            "search.tries" => search.tries.map(|t| t.to_string()),
            "search.seed" => search.seed.map(|s| s.to_string()),
            "search.timeout_ms" => search.timeout_ms.map(|t| t.to_string()),
            _ => return None,
        };
        Some(value.unwrap_or_default())
    }

    /// Set a key; an empty value unsets optional keys
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let search = &mut self.search;
        match key {
            "data_dir" => self.data_dir = optional(value, |v| Ok(PathBuf::from(v)))?,
            "search.step_limit" => search.step_limit = value.parse()?,
            "search.verify_ceiling" => search.verify_ceiling = value.parse()?,
            "search.policy" => search.policy = value.parse().map_err(anyhow::Error::msg)?,
            "search.tries" => search.tries = optional(value, |v| Ok(v.parse()?))?,
            "search.seed" => search.seed = optional(value, |v| Ok(v.parse()?))?,
            "search.timeout_ms" => search.timeout_ms = optional(value, |v| Ok(v.parse()?))?,
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                Self::keys().join(", ")
            ),
        }
        self.search.validate()?;
        Ok(())
    }
}

fn optional<T>(value: &str, parse: impl Fn(&str) -> anyhow::Result<T>) -> anyhow::Result<Option<T>> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}
