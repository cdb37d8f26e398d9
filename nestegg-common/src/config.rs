//! Configuration loading and database path resolution
//!
//! Configuration never prevents startup: a missing or unparsable TOML file
//! logs a warning and the compiled defaults are used instead.
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `NESTEGG_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/nestegg/config.toml`)
//!
//! Database path resolution order:
//! 1. Command-line argument
//! 2. `NESTEGG_DATABASE` environment variable
//! 3. `database_path` from the TOML file
//! 4. OS-dependent compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NESTEGG_CONFIG";

/// Environment variable naming an explicit database file
pub const DATABASE_ENV_VAR: &str = "NESTEGG_DATABASE";

/// Default alert refresh interval (5 minutes)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Default bound on a single evaluator's queries
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub database_path: PathBuf,
    pub config_path: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = if cfg!(target_os = "linux") {
            // ~/.local/share/nestegg (or /var/lib/nestegg for system-wide)
            dirs::data_local_dir()
                .map(|d| d.join("nestegg"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/nestegg"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("nestegg"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/nestegg"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("nestegg"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\nestegg"))
        } else {
            PathBuf::from("./nestegg_data")
        };

        Self {
            database_path: data_dir.join("nestegg.db"),
            config_path: dirs::config_dir().map(|d| d.join("nestegg").join("config.toml")),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Alert engine section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Interval between automatic refreshes
    pub refresh_interval_secs: u64,
    /// Upper bound for one evaluator's queries
    pub query_timeout_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

/// Display section, handed to the alert text formatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_symbol: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
        }
    }
}

/// Contents of `config.toml`
///
/// Every field is optional; absent sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub group_id: Option<String>,
    pub logging: LoggingConfig,
    pub alerts: AlertsConfig,
    pub display: DisplayConfig,
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.alerts.refresh_interval_secs == 0 {
            return Err(Error::Config(
                "alerts.refresh_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.alerts.query_timeout_secs == 0 {
            return Err(Error::Config(
                "alerts.query_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves the config file and database path from CLI, env, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_config: Option<PathBuf>,
    cli_database: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_config: Option<PathBuf>, cli_database: Option<PathBuf>) -> Self {
        Self {
            cli_config,
            cli_database,
        }
    }

    /// Config file to read, if any
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_config {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        CompiledDefaults::for_current_platform()
            .config_path
            .filter(|p| p.exists())
    }

    /// Load configuration, falling back to defaults on any failure
    pub fn load(&self) -> TomlConfig {
        let Some(path) = self.config_path() else {
            info!("No config file found, using compiled defaults");
            return TomlConfig::default();
        };

        match TomlConfig::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Failed to load config file {}: {} (using defaults)",
                    path.display(),
                    e
                );
                TomlConfig::default()
            }
        }
    }

    /// Database file to open
    pub fn database_path(&self, config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_database {
            return path.clone();
        }

        if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &config.database_path {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().database_path
    }
}
