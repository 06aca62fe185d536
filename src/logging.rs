//! Logging Setup
//!
//! `log`-facade logger with text and JSON output, writing to the console
//! and optionally a file with an independent level. JSON lines carry a
//! local timestamp, level and message.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter};
use serde::Serialize;

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// One JSON log line.
#[derive(Debug, Serialize)]
struct JsonLogEntry {
    timestamp: String,
    level: String,
    message: String,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
    pub file_level: Option<LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            format: LogFormat::Text,
            file: None,
            file_level: None,
        }
    }
}

struct BridgeLogger {
    config: LogConfig,
}

impl BridgeLogger {
    fn format_line(&self, level: Level, message: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let level = level.to_string().to_uppercase();
        match self.config.format {
            LogFormat::Text => format!("{} [{}] {}", timestamp, level, message),
            LogFormat::Json => {
                let entry = JsonLogEntry {
                    timestamp: timestamp.clone(),
                    level: level.clone(),
                    message: message.to_string(),
                };
                serde_json::to_string(&entry)
                    .unwrap_or_else(|_| format!("{} [{}] {}", timestamp, level, message))
            }
        }
    }

    fn file_target(&self) -> Option<(&Path, LevelFilter)> {
        match (&self.config.file, self.config.file_level) {
            (Some(path), Some(level)) => Some((path.as_path(), level)),
            _ => None,
        }
    }
}

impl log::Log for BridgeLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.config.console_level
            || self
                .file_target()
                .is_some_and(|(_, level)| metadata.level() <= level)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format_line(record.level(), &record.args().to_string());

        if record.level() <= self.config.console_level {
            let _ = writeln!(io::stderr(), "{}", line);
        }
        if let Some((path, level)) = self.file_target() {
            if record.level() <= level {
                if let Err(e) = append_line(path, &line) {
                    eprintln!("File logging error: {}", e);
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;
    writeln!(file, "{}", line).context("Failed to write to log file")
}

/// Install the global logger. Call once, before any logging.
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = config
        .file_level
        .map_or(config.console_level, |file| file.max(config.console_level));
    log::set_boxed_logger(Box::new(BridgeLogger { config }))
        .context("Failed to set global logger")?;
    log::set_max_level(max_level);
    Ok(())
}

/// Convert a level name to a `LevelFilter`.
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        "off" => Ok(LevelFilter::Off),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )),
    }
}
