// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Thin handle giving callers access to the console task and its events.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{error, info, warn};

use rkit_core::{MessageEvent, MessageKind};

use crate::console_task::ConsoleCommand;
use crate::error::ConsoleError;

/// Capacity of the console's inbound command queue.
pub const CONSOLE_QUEUE_SIZE: usize = 100;
/// Relayed events kept for slow subscribers.
pub const EVENT_BUFFER: usize = 256;

#[derive(Clone)]
pub struct ConsoleHandle {
    name: String,
    /// Send commands to the console task.
    pub console_tx: mpsc::Sender<ConsoleCommand>,
    events_tx: broadcast::Sender<MessageEvent>,
}

impl ConsoleHandle {
    pub fn new(
        name: &str,
        console_tx: mpsc::Sender<ConsoleCommand>,
        events_tx: broadcast::Sender<MessageEvent>,
    ) -> Self {
        Self {
            name: name.to_string(),
            console_tx,
            events_tx,
        }
    }

    /// Queue a control state broadcast. Waits while the queue is full and
    /// returns once the command is queued, not once arms have answered.
    pub async fn set_robot_control_state(
        &self,
        state: impl Into<String>,
    ) -> Result<(), ConsoleError> {
        self.console_tx
            .send(ConsoleCommand::SetRobotControlState(state.into()))
            .await
            .map_err(|_| ConsoleError::Stopped(self.name.clone()))
    }

    pub async fn arms(&self) -> Result<Vec<String>, ConsoleError> {
        let (respond_to, response) = oneshot::channel();
        self.console_tx
            .send(ConsoleCommand::GetArms { respond_to })
            .await
            .map_err(|_| ConsoleError::Stopped(self.name.clone()))?;
        response
            .await
            .map_err(|_| ConsoleError::Stopped(self.name.clone()))
    }

    /// Receive the Error, Warning and Status events relayed by the console.
    ///
    /// Each relayed event reaches every subscriber once, as long as the
    /// subscriber keeps within [`EVENT_BUFFER`] events of the console. A
    /// subscriber further behind gets `RecvError::Lagged` with the number
    /// of events it lost and resumes at the oldest one still buffered.
    pub fn subscribe(&self) -> broadcast::Receiver<MessageEvent> {
        self.events_tx.subscribe()
    }
}

/// Log every relayed event at the level matching its kind until the
/// console's event channel closes.
pub async fn log_events(mut rx: broadcast::Receiver<MessageEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match event.kind {
                MessageKind::Error => error!("{}", event.message),
                MessageKind::Warning => warn!("{}", event.message),
                MessageKind::Status => info!("{}", event.message),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event log fell behind, {} event(s) skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commands_queue_in_order() {
        let (console_tx, mut console_rx) = mpsc::channel(CONSOLE_QUEUE_SIZE);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let handle = ConsoleHandle::new("console", console_tx, events_tx);

        handle.set_robot_control_state("READY").await.unwrap();
        handle.set_robot_control_state("DISABLED").await.unwrap();
        for expected in ["READY", "DISABLED"] {
            match console_rx.recv().await {
                Some(ConsoleCommand::SetRobotControlState(state)) => assert_eq!(state, expected),
                other => panic!("unexpected command {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_stopped_console_reported() {
        let (console_tx, console_rx) = mpsc::channel(CONSOLE_QUEUE_SIZE);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let handle = ConsoleHandle::new("console", console_tx, events_tx);
        drop(console_rx);

        assert_eq!(
            handle.set_robot_control_state("READY").await,
            Err(ConsoleError::Stopped("console".to_string()))
        );
        assert!(handle.arms().await.is_err());
    }

    #[tokio::test]
    async fn test_slow_subscriber_told_how_many_events_it_lost() {
        let (console_tx, _console_rx) = mpsc::channel(CONSOLE_QUEUE_SIZE);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let handle = ConsoleHandle::new("console", console_tx, events_tx.clone());
        let mut rx = handle.subscribe();

        for i in 0..EVENT_BUFFER + 3 {
            events_tx.send(MessageEvent::status(format!("tick {}", i))).unwrap();
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap(), MessageEvent::status("tick 3"));
    }

    #[tokio::test]
    async fn test_log_events_ends_when_channel_closes() {
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let rx = events_tx.subscribe();
        events_tx.send(MessageEvent::warning("PSM1: tool missing")).unwrap();
        drop(events_tx);
        log_events(rx).await;
    }
}
