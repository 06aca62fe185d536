use std::process;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::{error, warn};
use tokio::io::AsyncBufReadExt;

use scanbridge::bridge::ScanBridge;
use scanbridge::cli::{self, Args, BridgeCommand};
use scanbridge::commands;
use scanbridge::config::{BridgeConfig, LoggingConfig};
use scanbridge::event::{RawNotification, ScanEvent};
use scanbridge::logging::{self, LogConfig};
use scanbridge::relay::{EventSink, RelayError, RelayResult};
use scanbridge::store::LastScanStore;

fn main() {
    if let Err(e) = run() {
        error!("Application error: {}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    let config = BridgeConfig::load(args.config_file.as_deref())?;
    logging::init_logger(configure_logging(&args, &config.logging)?)?;

    // Single runtime for the whole application; current_thread is plenty
    // for the bridge's event-driven workload.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match args.command {
        BridgeCommand::Listen => runtime.block_on(run_listen(config)),
        BridgeCommand::Last => {
            let store = LastScanStore::open(&config.store.path);
            println!("{}", store.read());
            Ok(())
        }
        BridgeCommand::Trigger => {
            finish_command(commands::trigger_scan(&config.commands), "Soft trigger")
        }
        BridgeCommand::OpenApp => finish_command(
            commands::open_scanner_app(&config.commands),
            "Opening the scanner application",
        ),
    }
}

/// Merge command-line logging flags over the configuration file values.
fn configure_logging(args: &Args, config: &LoggingConfig) -> Result<LogConfig> {
    let console_level = if args.debug {
        log::LevelFilter::Trace
    } else if args.verbose {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Error
    } else {
        logging::parse_log_level(&config.level)?
    };

    let format = args
        .log_format
        .as_deref()
        .unwrap_or(&config.format)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let file = args.log_file.clone().or_else(|| config.file.clone());
    let file_level = match (&file, args.log_file_level.as_deref().or(config.file_level.as_deref())) {
        (Some(_), Some(level)) => Some(logging::parse_log_level(level)?),
        // A file without an explicit level follows the console level.
        (Some(_), None) => Some(console_level),
        (None, _) => None,
    };

    Ok(LogConfig {
        console_level,
        format,
        file,
        file_level,
    })
}

fn finish_command(ok: bool, what: &str) -> Result<()> {
    if ok {
        println!("ok");
        Ok(())
    } else {
        Err(anyhow::anyhow!("{} failed", what))
    }
}

/// Subscriber used by `listen`: canonical events as JSON lines on stdout.
struct JsonLineSink;

#[async_trait]
impl EventSink for JsonLineSink {
    async fn deliver(&self, event: ScanEvent) -> RelayResult<()> {
        let line = serde_json::to_string(&event)
            .map_err(|e| RelayError::delivery_failed(e.to_string()))?;
        println!("{}", line);
        Ok(())
    }
}

async fn run_listen(config: BridgeConfig) -> Result<()> {
    let bridge = ScanBridge::start(config);
    let handle = bridge.subscribe(Arc::new(JsonLineSink));

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawNotification>(line) {
            Ok(bag) => {
                bridge.notify(bag);
            }
            Err(e) => warn!("Ignoring malformed notification line: {}", e),
        }
    }

    // Let in-flight notifications drain before detaching.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    bridge.unsubscribe(&handle);
    bridge.shutdown();
    Ok(())
}
