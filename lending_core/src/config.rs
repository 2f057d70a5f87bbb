//! Configuration file support for Biblio.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/biblio/config.toml`.

use crate::types::LendingPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Lending policy configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_loan_period_days")]
    pub loan_period_days: i64,

    #[serde(default = "default_fine_per_day")]
    pub fine_per_day: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            loan_period_days: default_loan_period_days(),
            fine_per_day: default_fine_per_day(),
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> LendingPolicy {
        LendingPolicy {
            loan_period_days: self.loan_period_days,
            fine_per_day: self.fine_per_day,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("biblio")
}

fn default_loan_period_days() -> i64 {
    14
}

fn default_fine_per_day() -> f64 {
    0.50
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        if config.policy.loan_period_days <= 0 {
            return Err(Error::Config(
                "loan_period_days must be positive".to_string(),
            ));
        }
        if config.policy.fine_per_day < 0.0 {
            return Err(Error::Config("fine_per_day must not be negative".to_string()));
        }
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("biblio").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
