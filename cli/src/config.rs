use anyhow::{Context, Result};
use co2forecast_core::{EngineConfig, Gwp};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default GWP horizon for Scope 1 estimates
    pub gwp: Gwp,

    /// Country whose conversion constants override the defaults
    pub country: Option<String>,

    /// Output format (json, table, text)
    pub output_format: OutputFormat,

    /// Engine configuration file (TOML); built-in defaults when unset
    pub engine_config: Option<PathBuf>,

    /// Enable debug logging
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Table,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!("Invalid output format: {}", other)),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            gwp: Gwp::Gwp100,
            country: None,
            output_format: OutputFormat::Table,
            engine_config: None,
            debug: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from the default location, defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: CliConfig = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = home_dir().context("Failed to get home directory")?;
        Ok(home.join(".co2forecast").join("config.toml"))
    }

    /// Engine configuration from `engine_config`, or the built-in defaults
    pub fn engine(&self) -> Result<EngineConfig> {
        match &self.engine_config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load engine config {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }
}
