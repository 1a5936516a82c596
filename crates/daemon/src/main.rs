// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process supervisor daemon (svd)
//!
//! Background process that owns the reconciliation loop (component G) and
//! reacts to nothing but its own tick timer and OS signals. Unlike an async
//! service, this is a single plain OS thread per §5: the loop's own
//! blocking points (fork/exec, `/proc` reads, bounded-retry socket I/O) are
//! already bounded, so there is no event loop to drive underneath it.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use sv_adapters::{signals, FileConfigAdapter};
use sv_core::{Clock, SystemClock};
use sv_daemon::Config;
use sv_engine::{env as engine_env, Supervisor, SupervisorConfig};
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("svd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("svd {}", env!("CARGO_PKG_VERSION"));
                println!("Process supervisor daemon - runs the reconciliation loop");
                println!();
                println!("USAGE:");
                println!("    svd");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: svd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    config.ensure_directories()?;

    let _log_guard = sv_daemon::setup_logging(&config);

    info!("starting supervisor daemon");

    let adapter = Box::new(FileConfigAdapter::new(config.config_path.clone()));
    let clock: Box<dyn Clock> = Box::new(SystemClock::new());

    let supervisor_config = SupervisorConfig {
        tick_period: engine_env::tick_period(),
        grace_period: engine_env::grace_period(),
        restart_window: engine_env::restart_window(),
        dial_period_ticks: engine_env::dial_period_ticks(),
        protocol_retries: engine_env::protocol_retries(),
        protocol_retry_interval: engine_env::protocol_retry_interval(),
        sockets_dir: config.sockets_dir.clone(),
        logs_dir: config.logs_dir.clone(),
    };

    let mut supervisor = match Supervisor::new(adapter, clock, supervisor_config) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to load initial configuration: {e}");
            return Err(e.into());
        }
    };

    signals::install(supervisor.stop_handle(), supervisor.shutdown_mode_handle())?;

    info!(
        config_path = %config.config_path.display(),
        "daemon ready"
    );
    println!("READY");

    supervisor.run_until_stopped();

    info!("daemon stopped");
    Ok(())
}
