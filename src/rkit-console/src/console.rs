// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Console orchestrator: registered arms, control state broadcast and
//! event relay.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

use rkit_core::{
    ComponentRegistry, EventSink, ExecutionError, MessageEvent, RequiredInterface,
    SET_ROBOT_CONTROL_STATE,
};

use crate::arm::ArmDescriptor;
use crate::error::RegistrationError;
use crate::wiring::setup_and_connect_interfaces;

/// An arm that did not accept a broadcast control state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub arm: String,
    pub state: String,
    pub error: ExecutionError,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to set state \"{}\" for arm \"{}\": {}",
            self.state, self.arm, self.error
        )
    }
}

pub struct Console {
    name: String,
    registry: Arc<dyn ComponentRegistry>,
    period: Option<Duration>,
    config_file: Option<PathBuf>,
    arms: Vec<ArmDescriptor>,
    endpoints: HashMap<String, RequiredInterface>,
    event_tx: EventSink,
    event_rx: mpsc::UnboundedReceiver<MessageEvent>,
    main_events: broadcast::Sender<MessageEvent>,
}

impl Console {
    /// `main_events` carries the Error, Warning and Status events of the
    /// console's "Main" interface.
    pub fn new(
        name: &str,
        registry: Arc<dyn ComponentRegistry>,
        main_events: broadcast::Sender<MessageEvent>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            name: name.to_string(),
            registry,
            period: None,
            config_file: None,
            arms: Vec::new(),
            endpoints: HashMap::new(),
            event_tx,
            event_rx,
            main_events,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the console's periodic hook at `period` in addition to waking
    /// on commands and events.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = (!period.is_zero()).then_some(period);
        self
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn configure(&mut self, config_file: &Path) {
        info!("{}: Configure {}", self.name, config_file.display());
        self.config_file = Some(config_file.to_path_buf());
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Register a configured arm. Both of its configuration files must be
    /// known.
    pub fn add_arm(&mut self, arm: ArmDescriptor) -> Result<(), RegistrationError> {
        if !arm.is_configured() {
            let err = RegistrationError::NotConfigured(arm.name().to_string());
            error!("{}: AddArm, {}", self.name, err);
            return Err(err);
        }
        self.register(arm)
    }

    /// Register an arm component already present in the registry, without
    /// control loop or configuration checks.
    pub fn add_external_arm(&mut self, name: &str) -> Result<(), RegistrationError> {
        self.register(ArmDescriptor::external(name))
    }

    pub fn arm_names(&self) -> Vec<&str> {
        self.arms.iter().map(|arm| arm.name()).collect()
    }

    pub fn arm(&self, name: &str) -> Option<&ArmDescriptor> {
        self.arms.iter().find(|arm| arm.name() == name)
    }

    pub fn arm_count(&self) -> usize {
        self.arms.len()
    }

    /// Send `new_state` to every registered arm, one after the other in
    /// registration order. Each call waits for the arm's answer; there is
    /// no timeout. A failing arm is reported and does not stop delivery to
    /// the arms after it.
    pub async fn set_robot_control_state(&self, new_state: &str) -> Vec<DeliveryFailure> {
        let mut failures = Vec::new();
        for arm in &self.arms {
            let result = match arm.control_state_function() {
                Some(function) => function.call(new_state).await,
                None => Err(ExecutionError::NotBound(SET_ROBOT_CONTROL_STATE.to_string())),
            };
            if let Err(error) = result {
                let failure = DeliveryFailure {
                    arm: arm.name().to_string(),
                    state: new_state.to_string(),
                    error,
                };
                error!("{}: SetRobotControlState: {}", self.name, failure);
                failures.push(failure);
            }
        }
        failures
    }

    /// Re-emit an event received from an arm on the console's own
    /// interface, keeping its kind.
    pub fn relay(&self, event: MessageEvent) {
        debug!("{}: relaying {}: {}", self.name, event.kind, event.message);
        // No subscriber is not an error.
        let _ = self.main_events.send(event);
    }

    /// Relayed events for one subscriber. A subscriber that falls more
    /// than the channel capacity behind loses the oldest events and is told
    /// so through `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<MessageEvent> {
        self.main_events.subscribe()
    }

    /// Relay every queued event. Returns how many were relayed.
    pub fn process_queued_events(&mut self) -> usize {
        let mut relayed = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.relay(event);
            relayed += 1;
        }
        relayed
    }

    /// Wait for the next event forwarded by an arm endpoint.
    pub(crate) async fn next_event(&mut self) -> Option<MessageEvent> {
        self.event_rx.recv().await
    }

    fn register(&mut self, mut arm: ArmDescriptor) -> Result<(), RegistrationError> {
        match setup_and_connect_interfaces(
            &self.name,
            self.registry.as_ref(),
            &mut self.endpoints,
            &arm,
            &self.event_tx,
        ) {
            Ok(control_state) => {
                arm.mark_registered(control_state);
                info!("{}: added arm {} ({})", self.name, arm.name(), arm.arm_type());
                self.arms.push(arm);
                Ok(())
            }
            Err(source) => {
                let err = RegistrationError::Wiring {
                    arm: arm.name().to_string(),
                    source,
                };
                error!("{}: AddArm, {}", self.name, err);
                Err(err)
            }
        }
    }
}
