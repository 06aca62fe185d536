//! Configuration Loading
//!
//! TOML configuration resolved through a discovery hierarchy:
//! `$SCANBRIDGE_CONFIG`, the XDG config directory, a home dotfile, then
//! the project-local file. An explicit path from the command line wins
//! over discovery. A missing file means defaults throughout.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;

use crate::bus;
use crate::store;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BridgeConfig {
    pub store: StoreConfig,
    pub bus: BusConfig,
    pub commands: CommandsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Backing file for the last-scan cache.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: store::default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BusConfig {
    /// Buffer depth of each broadcast channel.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: bus::DEFAULT_CAPACITY,
        }
    }
}

/// Command lines for the best-effort scanner commands. Defaults drive an
/// attached device through adb, mirroring what the scanner vendors expose;
/// deployments with local helpers override these.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CommandsConfig {
    /// Soft-trigger command.
    pub trigger: Vec<String>,
    /// Scanner applications, tried in order.
    pub apps: Vec<Vec<String>>,
    /// Generic settings surface, the last resort.
    pub settings: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        let argv = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            trigger: argv(&[
                "adb",
                "shell",
                "am",
                "broadcast",
                "-a",
                "com.symbol.datawedge.api.ACTION",
                "--es",
                "com.symbol.datawedge.api.SOFT_SCAN_TRIGGER",
                "START_SCANNING",
            ]),
            apps: vec![
                argv(&["adb", "shell", "monkey", "-p", "com.android.scanner", "1"]),
                argv(&["adb", "shell", "monkey", "-p", "com.zq.scanner", "1"]),
                argv(&["adb", "shell", "monkey", "-p", "com.symbol.datawedge", "1"]),
                argv(&["adb", "shell", "monkey", "-p", "com.honeywell.decodeconfig", "1"]),
            ],
            settings: argv(&["adb", "shell", "am", "start", "-a", "android.settings.SETTINGS"]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Console log level.
    pub level: String,
    /// Output format: text or json.
    pub format: String,
    /// Optional log file.
    pub file: Option<PathBuf>,
    /// Log level for file output, independent of the console level.
    pub file_level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
            file_level: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration. An explicit path is required to exist; the
    /// discovery hierarchy tolerates absence.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        for path in discover_config_files() {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(&path);
            }
        }
        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Discovery order, highest precedence first.
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(env_path) = env::var("SCANBRIDGE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("scanbridge").join("config.toml"));
    }
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".scanbridge.toml"));
    }
    paths.push(PathBuf::from("./.scanbridge.toml"));
    paths
}
