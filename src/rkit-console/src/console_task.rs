// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use rkit_core::DynResult;

use crate::console::Console;

/// Inbound commands of the console's "Main" interface.
#[derive(Debug)]
pub enum ConsoleCommand {
    /// Broadcast a control state to every registered arm.
    SetRobotControlState(String),
    /// Names of the registered arms, in registration order.
    GetArms {
        respond_to: oneshot::Sender<Vec<String>>,
    },
}

/// Run the console until its command channel closes or shutdown is
/// signalled. Every activation drains all queued commands, in arrival
/// order, then all queued events.
pub async fn run_console_task(
    mut console: Console,
    mut rx: mpsc::Receiver<ConsoleCommand>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> DynResult<()> {
    info!("{}: Startup ({} arm(s))", console.name(), console.arm_count());

    let mut ticker = console.period().map(|period| {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    let mut shutdown_open = true;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed(), if shutdown_open => {
                if changed.is_err() {
                    shutdown_open = false;
                }
            }

            maybe_cmd = rx.recv() => {
                let Some(first_cmd) = maybe_cmd else { break; };
                activate(&mut console, &mut rx, Some(first_cmd)).await;
            }

            Some(event) = console.next_event() => {
                console.relay(event);
                activate(&mut console, &mut rx, None).await;
            }

            _ = next_tick(&mut ticker) => {
                activate(&mut console, &mut rx, None).await;
            }
        }
    }

    let relayed = console.process_queued_events();
    if relayed > 0 {
        debug!("{}: relayed {} event(s) before cleanup", console.name(), relayed);
    }
    info!("{}: Cleanup", console.name());
    Ok(())
}

async fn activate(
    console: &mut Console,
    rx: &mut mpsc::Receiver<ConsoleCommand>,
    first_cmd: Option<ConsoleCommand>,
) {
    let mut batch: Vec<ConsoleCommand> = first_cmd.into_iter().collect();
    while let Ok(next) = rx.try_recv() {
        batch.push(next);
    }

    for cmd in batch {
        process_command(console, cmd).await;
    }
    console.process_queued_events();
}

async fn process_command(console: &Console, cmd: ConsoleCommand) {
    match cmd {
        ConsoleCommand::SetRobotControlState(state) => {
            let started = Instant::now();
            let failures = console.set_robot_control_state(&state).await;
            let elapsed = started.elapsed();
            if elapsed > Duration::from_millis(500) {
                warn!("{}: SetRobotControlState {} took {:?}", console.name(), state, elapsed);
            } else {
                debug!(
                    "{}: SetRobotControlState {} completed in {:?} ({} failure(s))",
                    console.name(),
                    state,
                    elapsed,
                    failures.len()
                );
            }
        }
        ConsoleCommand::GetArms { respond_to } => {
            let names = console.arm_names().into_iter().map(String::from).collect();
            let _ = respond_to.send(names);
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
