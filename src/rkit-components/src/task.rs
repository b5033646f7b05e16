// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Execution task of one registered component.

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info};

use rkit_core::{CommandRequest, Component, ComponentEvents};

/// Drain requests in arrival order and run the periodic hook until shutdown.
pub(crate) async fn run_component_task(
    mut component: Box<dyn Component>,
    mut requests: mpsc::Receiver<CommandRequest>,
    events: ComponentEvents,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let name = component.name().to_string();
    debug!("{}: Startup", name);
    component.startup(&events);

    let mut ticker = component.period().map(|period| {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    let mut requests_open = true;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        if !requests_open && ticker.is_none() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }

            maybe_req = requests.recv(), if requests_open => {
                let Some(first_req) = maybe_req else {
                    requests_open = false;
                    continue;
                };

                let mut batch = vec![first_req];
                while let Ok(next) = requests.try_recv() {
                    batch.push(next);
                }

                for CommandRequest { interface, command, argument, respond_to } in batch {
                    let result = component.execute(&interface, &command, &argument, &events);
                    if let Err(e) = &result {
                        debug!("{}: {}.{}({:?}) failed: {}", name, interface, command, argument, e);
                    }
                    let _ = respond_to.send(result);
                }
            }

            _ = next_tick(&mut ticker) => {
                component.run(&events);
            }
        }
    }

    component.cleanup();
    info!("{}: component task stopped", name);
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
