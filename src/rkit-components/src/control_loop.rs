// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated joint control loop.
//!
//! Stands in for the PID controller: serves the `Controller` interface and
//! declares its torque and trigger links, without computing anything.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use rkit_core::{
    Component, ComponentEvents, DynResult, ExecutionError, ExecutionResult, MessageKind,
    ProvidedSpec, CONTROLLER_INTERFACE, ENABLE_COMMAND, EXEC_IN_INTERFACE, TORQUE_INTERFACE,
};

pub struct SimControlLoop {
    name: String,
    period: Duration,
    config_file: Option<PathBuf>,
    enabled: bool,
}

impl SimControlLoop {
    pub fn new(name: &str, period: Duration) -> Self {
        Self {
            name: name.to_string(),
            period,
            config_file: None,
            enabled: false,
        }
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Component for SimControlLoop {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> Option<Duration> {
        (!self.period.is_zero()).then_some(self.period)
    }

    fn provided_interfaces(&self) -> Vec<ProvidedSpec> {
        vec![ProvidedSpec::new(CONTROLLER_INTERFACE, &[ENABLE_COMMAND])]
    }

    fn required_interfaces(&self) -> Vec<String> {
        vec![TORQUE_INTERFACE.to_string(), EXEC_IN_INTERFACE.to_string()]
    }

    fn configure(&mut self, config_file: &Path) -> DynResult<()> {
        debug!("{}: Configure {}", self.name, config_file.display());
        self.config_file = Some(config_file.to_path_buf());
        Ok(())
    }

    fn execute(
        &mut self,
        interface: &str,
        command: &str,
        argument: &str,
        events: &ComponentEvents,
    ) -> ExecutionResult {
        if interface != CONTROLLER_INTERFACE || command != ENABLE_COMMAND {
            return Err(ExecutionError::UnknownCommand {
                interface: interface.to_string(),
                command: command.to_string(),
            });
        }
        let enable = argument.parse::<bool>().map_err(|_| {
            ExecutionError::rejected(format!("{}: Enable expects true or false", self.name))
        })?;
        self.enabled = enable;
        let message = format!(
            "{}: controller {}",
            self.name,
            if enable { "enabled" } else { "disabled" }
        );
        events.emit(CONTROLLER_INTERFACE, MessageKind::Status, &message);
        Ok(())
    }
}
