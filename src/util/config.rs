use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::{ProfitPolicy, Server};
use crate::pricing::MarketSettings;
use crate::util::logging::LoggingConfig;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "CraftProfitScanner";
const APP_NAME: &str = "CraftProfitScanner";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    /// JSON export of the item catalog.
    pub catalog_path: Option<PathBuf>,
    /// Replaces the regional API hosts, e.g. for a self-hosted mirror.
    pub base_url: Option<String>,
    pub markets: MarketSettings,
    pub economy: ProfitPolicy,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: Server::default(),
            catalog_path: None,
            base_url: None,
            markets: MarketSettings::default(),
            economy: ProfitPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Brings values into their valid ranges.
    pub fn normalized(mut self) -> Self {
        self.economy.return_rate = self.economy.return_rate.clamp(0.0, 1.0);
        self.economy.market_tax_rate = self.economy.market_tax_rate.clamp(0.0, 1.0);
        self.markets.history_window = self.markets.history_window.max(1);
        self
    }
}

/// Where a loaded config came from. Logging is not set up while the config loads, so
/// callers report this once the subscriber exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    CreatedDefault,
}

pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: default_config_path(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the config file, writing the defaults out first when none exists.
    pub fn load(&self) -> Result<(Config, ConfigOrigin)> {
        if !self.config_path.exists() {
            let config = Config::default();
            self.save(&config)?;
            return Ok((config, ConfigOrigin::CreatedDefault));
        }

        let contents =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok((config.normalized(), ConfigOrigin::File))
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_string).context("Failed to write config file")?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}
