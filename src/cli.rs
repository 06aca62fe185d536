//! Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Barcode scan-event bridge
#[derive(Parser, Debug)]
#[command(name = "scanbridge")]
#[command(
    about = "Bridges hardware barcode scanner broadcasts into canonical scan events, with a pull cache for the last scan and a live subscriber stream"
)]
#[command(version)]
pub struct Args {
    /// Verbose output (debug level logging)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: BridgeCommand,
}

#[derive(Subcommand, Debug)]
pub enum BridgeCommand {
    /// Run the bridge: JSON notification bags on stdin, canonical scan
    /// events on stdout
    Listen,
    /// Print the last persisted scan code
    Last,
    /// Fire the scanner soft trigger
    Trigger,
    /// Open the vendor scanning application
    OpenApp,
}

pub fn parse_args() -> Args {
    Args::parse()
}
