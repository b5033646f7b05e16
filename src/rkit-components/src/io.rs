// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated IO driver.
//!
//! Exposes one interface per attached arm plus its auxiliary signals, and
//! the `ExecOut` trigger used by signal-driven control loops.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use rkit_core::{
    ArmType, Component, ComponentEvents, DynResult, ExecutionError, ExecutionResult, ProvidedSpec,
    EXEC_OUT_INTERFACE,
};

pub struct SimIo {
    name: String,
    period: Duration,
    config_file: Option<PathBuf>,
    robots: Vec<(String, ArmType)>,
}

impl SimIo {
    pub fn new(name: &str, period: Duration) -> Self {
        Self {
            name: name.to_string(),
            period,
            config_file: None,
            robots: Vec::new(),
        }
    }

    /// Attach an arm; its interfaces appear when the driver is registered.
    pub fn with_robot(mut self, name: &str, arm_type: ArmType) -> Self {
        self.robots.push((name.to_string(), arm_type));
        self
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}

impl Component for SimIo {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> Option<Duration> {
        (!self.period.is_zero()).then_some(self.period)
    }

    fn provided_interfaces(&self) -> Vec<ProvidedSpec> {
        let mut provided = Vec::new();
        for (robot, arm_type) in &self.robots {
            provided.push(ProvidedSpec::signal(robot.as_str()));
            for aux in arm_type.auxiliary_interfaces() {
                provided.push(ProvidedSpec::signal(format!("{}-{}", robot, aux)));
            }
        }
        provided.push(ProvidedSpec::signal(EXEC_OUT_INTERFACE));
        provided
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
        _argument: &str,
        _events: &ComponentEvents,
    ) -> ExecutionResult {
        Err(ExecutionError::UnknownCommand {
            interface: interface.to_string(),
            command: command.to_string(),
        })
    }
}
