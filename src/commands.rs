//! Scanner Command Surface
//!
//! Best-effort imperative calls towards the scanning hardware/software:
//! firing the soft trigger and opening the vendor scanning application.
//! Neither touches canonical event state. Failure is an expected,
//! first-class outcome reported as `false`, never a fault; every launch
//! error is absorbed here.

use std::process::{Command, Stdio};

use log::{debug, info};

use crate::config::CommandsConfig;

/// Fire the configured soft-trigger command.
pub fn trigger_scan(config: &CommandsConfig) -> bool {
    let ok = launch(&config.trigger);
    if ok {
        info!("Soft scan trigger sent");
    } else {
        debug!("Soft scan trigger failed");
    }
    ok
}

/// Launch the first scanner application that starts, falling back to the
/// generic settings surface. Returns `true` on the first successful
/// launch, `false` only when every attempt including the fallback fails.
pub fn open_scanner_app(config: &CommandsConfig) -> bool {
    for candidate in &config.apps {
        if launch(candidate) {
            info!("Opened scanner application: {}", candidate.join(" "));
            return true;
        }
    }
    debug!("No scanner application available, falling back to settings");
    let ok = launch(&config.settings);
    if ok {
        info!("Opened settings surface");
    }
    ok
}

/// Run `argv` to completion with output suppressed. Commands are expected
/// to return promptly (launchers, broadcast helpers); success means a
/// zero exit status.
fn launch(argv: &[String]) -> bool {
    let Some((program, args)) = argv.split_first() else {
        debug!("Empty command line, nothing to launch");
        return false;
    };
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => true,
        Ok(status) => {
            debug!("{} exited with {}", program, status);
            false
        }
        Err(e) => {
            debug!("Could not launch {}: {}", program, e);
            false
        }
    }
}
