// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Independently scheduled components owned by a registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::arm::ComponentKind;
use crate::execution::ExecutionResult;
use crate::interface::{MessageEvents, MessageKind};
use crate::DynResult;

/// Everything a registry needs to build, configure and add a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub name: String,
    pub period: Duration,
    pub config_file: PathBuf,
}

/// Declaration of a provided interface: its name and served commands.
/// Every provided interface carries the Error/Warning/Status events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidedSpec {
    pub name: String,
    pub commands: Vec<String>,
}

impl ProvidedSpec {
    pub fn new(name: impl Into<String>, commands: &[&str]) -> Self {
        Self {
            name: name.into(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Interface carrying events or signals only.
    pub fn signal(name: impl Into<String>) -> Self {
        Self::new(name, &[])
    }
}

/// Event generators of a component's provided interfaces.
#[derive(Debug, Clone, Default)]
pub struct ComponentEvents {
    interfaces: HashMap<String, MessageEvents>,
}

impl ComponentEvents {
    pub fn new(interfaces: HashMap<String, MessageEvents>) -> Self {
        Self { interfaces }
    }

    pub fn get(&self, interface: &str) -> Option<&MessageEvents> {
        self.interfaces.get(interface)
    }

    /// Emit on one provided interface. Unknown interfaces reach nobody.
    pub fn emit(&self, interface: &str, kind: MessageKind, message: &str) -> usize {
        self.interfaces
            .get(interface)
            .map(|events| events.emit(kind, message))
            .unwrap_or(0)
    }
}

/// A unit the registry schedules on its own task.
pub trait Component: Send + 'static {
    fn name(&self) -> &str;

    /// Period of the component's own cycle; `None` runs on requests only.
    fn period(&self) -> Option<Duration> {
        None
    }

    fn provided_interfaces(&self) -> Vec<ProvidedSpec>;

    fn required_interfaces(&self) -> Vec<String> {
        Vec::new()
    }

    /// Load the component's configuration file. The path is opaque to
    /// everyone but the component.
    fn configure(&mut self, config_file: &Path) -> DynResult<()>;

    fn startup(&mut self, _events: &ComponentEvents) {}

    /// Serve one command of a provided interface.
    fn execute(
        &mut self,
        interface: &str,
        command: &str,
        argument: &str,
        events: &ComponentEvents,
    ) -> ExecutionResult;

    /// Periodic hook, called once per period when `period()` is set.
    fn run(&mut self, _events: &ComponentEvents) {}

    fn cleanup(&mut self) {}
}
