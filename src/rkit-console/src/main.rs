// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use rkit_app::{init_logging, ConfigFile};
use rkit_components::{register_builtin_components_on, LocalRegistry, RegistrationContext};
use rkit_core::DynResult;

use rkit_console::setup;
use rkit_console::{
    log_events, run_console_task, Console, ConsoleConfig, ConsoleHandle, CONSOLE_QUEUE_SIZE,
    EVENT_BUFFER,
};

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - robotic arm console");

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Log level (trace, debug, info, warn, error), overrides the config file
    #[arg(long = "log-level")]
    log_level: Option<String>,
    /// Control state broadcast to every arm once the console is running
    #[arg(short = 's', long = "state")]
    state: Option<String>,
}

/// Broadcast every non-empty stdin line as a control state; `arms` lists
/// the registered arms instead.
async fn read_commands(handle: ConsoleHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("stdin: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let result = if line == "arms" {
            handle
                .arms()
                .await
                .map(|arms| info!("Arms: {}", arms.join(", ")))
        } else {
            handle.set_robot_control_state(line).await
        };
        if let Err(e) = result {
            error!("{}", e);
            break;
        }
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ConsoleConfig::example_combined_toml());
        return Ok(());
    }

    let (cfg, config_path) = ConsoleConfig::load(cli.config.as_deref())?;
    cfg.validate()
        .map_err(|e| format!("Invalid console configuration: {}", e))?;

    init_logging(
        cli.log_level
            .as_deref()
            .or(cfg.general.log_level.as_deref()),
    );

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    } else {
        warn!("No configuration file found, starting without arms");
    }

    let mut context = RegistrationContext::new();
    register_builtin_components_on(&mut context);
    let registry = Arc::new(LocalRegistry::new(context));
    setup::add_io_components(&cfg, registry.as_ref())?;

    let (console_tx, console_rx) = mpsc::channel(CONSOLE_QUEUE_SIZE);
    let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
    let mut console = Console::new(&cfg.console.name, registry.clone(), events_tx.clone())
        .with_period(cfg.console.period());
    if let Some(ref path) = cfg.console.config_file {
        console.configure(path);
    }
    setup::setup_arms(&cfg, registry.as_ref(), &mut console);

    let handle = ConsoleHandle::new(&cfg.console.name, console_tx, events_tx);
    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();
    task_handles.push(tokio::spawn(log_events(handle.subscribe())));

    registry.start();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let console_task = tokio::spawn(async move {
        if let Err(e) = run_console_task(console, console_rx, shutdown_rx).await {
            error!("Console task error: {:?}", e);
        }
    });

    if let Some(state) = cli.state {
        handle.set_robot_control_state(state).await?;
    }
    task_handles.push(tokio::spawn(read_commands(handle.clone())));

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");
    let _ = shutdown_tx.send(true);
    drop(handle);

    if let Err(e) = console_task.await {
        warn!("Console task ended abnormally: {}", e);
    }
    registry.shutdown().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    for handle in &task_handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }

    Ok(())
}
