// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Registries and recording components shared by the console tests.

use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rkit_components::{register_builtin_components_on, LocalRegistry, RegistrationContext, SimIo};
use rkit_core::{
    ArmType, Component, ComponentEvents, ComponentRegistry, DynResult, ExecutionError,
    ExecutionResult, MessageEvent, MessageKind, ProvidedSpec, ROBOT_INTERFACE,
    SET_ROBOT_CONTROL_STATE,
};

pub(crate) type StateLog = Arc<Mutex<Vec<(String, String)>>>;

/// Formatted log output captured on the current thread.
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Capture until the returned guard is dropped.
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_target(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn registry_without_io() -> Arc<LocalRegistry> {
    let mut context = RegistrationContext::new();
    register_builtin_components_on(&mut context);
    Arc::new(LocalRegistry::new(context))
}

pub(crate) fn registry_with_io(io: &str, robots: &[(&str, ArmType)]) -> Arc<LocalRegistry> {
    let registry = registry_without_io();
    let mut driver = SimIo::new(io, Duration::ZERO);
    for (name, arm_type) in robots {
        driver = driver.with_robot(name, *arm_type);
    }
    registry
        .add_component(Box::new(driver))
        .expect("io component added");
    registry
}

/// Arm recording every requested state into a log shared between arms.
pub(crate) struct RecordingArm {
    name: String,
    log: StateLog,
    refuse: bool,
}

impl RecordingArm {
    pub(crate) fn new(name: &str, log: &StateLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            refuse: false,
        }
    }

    /// Record the request, report it, then refuse it.
    pub(crate) fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }
}

impl Component for RecordingArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn provided_interfaces(&self) -> Vec<ProvidedSpec> {
        vec![ProvidedSpec::new(ROBOT_INTERFACE, &[SET_ROBOT_CONTROL_STATE])]
    }

    fn configure(&mut self, _config_file: &Path) -> DynResult<()> {
        Ok(())
    }

    fn execute(
        &mut self,
        interface: &str,
        _command: &str,
        argument: &str,
        events: &ComponentEvents,
    ) -> ExecutionResult {
        self.log
            .lock()
            .unwrap()
            .push((self.name.clone(), argument.to_string()));
        if self.refuse {
            events.emit(
                interface,
                MessageKind::Error,
                &format!("{} refused {}", self.name, argument),
            );
            return Err(ExecutionError::rejected("arm refused state"));
        }
        events.emit(
            interface,
            MessageKind::Status,
            &format!("{} entered {}", self.name, argument),
        );
        Ok(())
    }
}

/// Component emitting a fixed set of events when it starts, one provided
/// signal interface per event.
pub(crate) struct StartupEmitter {
    name: String,
    events: Vec<(String, MessageEvent)>,
}

impl StartupEmitter {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            events: Vec::new(),
        }
    }

    pub(crate) fn emitting(mut self, interface: &str, event: MessageEvent) -> Self {
        self.events.push((interface.to_string(), event));
        self
    }
}

impl Component for StartupEmitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn provided_interfaces(&self) -> Vec<ProvidedSpec> {
        self.events
            .iter()
            .map(|(interface, _)| ProvidedSpec::signal(interface.as_str()))
            .collect()
    }

    fn configure(&mut self, _config_file: &Path) -> DynResult<()> {
        Ok(())
    }

    fn startup(&mut self, events: &ComponentEvents) {
        for (interface, event) in &self.events {
            events.emit(interface, event.kind, &event.message);
        }
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
