use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    client::{ClientOption, HistoricalClient},
    unit::DataUnit,
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OWM_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// unit = "F"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,

    /// Default unit token: "C", "F" or "K".
    pub unit: Option<String>,

    pub timeout_secs: Option<u64>,

    /// Overrides the history endpoint, e.g. for a caching proxy.
    pub base_url: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "owm-history", "owm-history")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from `OWM_API_KEY`, falling back to the stored one.
    pub fn api_key(&self) -> Result<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    /// Same as [`Config::api_key`] with the environment value passed in.
    pub fn api_key_with_env(&self, env: Option<String>) -> Result<String> {
        env.filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: set {API_KEY_ENV} or run `owm-history configure` and enter your API key."
                )
            })
    }

    /// Configured unit, Celsius when none is set.
    pub fn unit_or_default(&self) -> Result<DataUnit> {
        match self.unit.as_deref() {
            Some(token) => DataUnit::from_token_ignore_case(token)
                .with_context(|| format!("Invalid unit in config file: '{token}'")),
            None => Ok(DataUnit::Celsius),
        }
    }

    pub fn client_options(&self) -> Vec<ClientOption> {
        let mut options = Vec::new();
        if let Some(secs) = self.timeout_secs {
            options.push(ClientOption::Timeout(Duration::from_secs(secs)));
        }
        if let Some(url) = &self.base_url {
            options.push(ClientOption::BaseUrl(url.clone()));
        }
        options
    }

    /// Build a client from this config. `unit` overrides the configured unit.
    pub fn build_client(&self, unit: Option<DataUnit>) -> Result<HistoricalClient> {
        let unit = match unit {
            Some(u) => u,
            None => self.unit_or_default()?,
        };
        let api_key = self.api_key()?;

        HistoricalClient::new(unit.token(), api_key, self.client_options())
            .context("Failed to create historical weather client")
    }
}
