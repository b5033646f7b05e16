// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated research-kit arm.
//!
//! Holds the requested control state in memory and reports every change on
//! its `Robot` interface. No kinematics or homing sequence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use rkit_core::{
    ArmType, Component, ComponentEvents, DynResult, ExecutionError, ExecutionResult, MessageKind,
    ProvidedSpec, PID_INTERFACE, ROBOT_INTERFACE, ROBOT_IO_INTERFACE, SET_ROBOT_CONTROL_STATE,
};

pub struct SimArm {
    name: String,
    arm_type: ArmType,
    period: Duration,
    config_file: Option<PathBuf>,
    control_state: Option<String>,
}

impl SimArm {
    pub fn new(name: &str, arm_type: ArmType, period: Duration) -> Self {
        Self {
            name: name.to_string(),
            arm_type,
            period,
            config_file: None,
            control_state: None,
        }
    }

    pub fn arm_type(&self) -> ArmType {
        self.arm_type
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn control_state(&self) -> Option<&str> {
        self.control_state.as_deref()
    }
}

impl Component for SimArm {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> Option<Duration> {
        (!self.period.is_zero()).then_some(self.period)
    }

    fn provided_interfaces(&self) -> Vec<ProvidedSpec> {
        vec![ProvidedSpec::new(ROBOT_INTERFACE, &[SET_ROBOT_CONTROL_STATE])]
    }

    fn required_interfaces(&self) -> Vec<String> {
        let mut required = vec![ROBOT_IO_INTERFACE.to_string(), PID_INTERFACE.to_string()];
        required.extend(
            self.arm_type
                .auxiliary_interfaces()
                .iter()
                .map(|aux| aux.to_string()),
        );
        required
    }

    fn configure(&mut self, config_file: &Path) -> DynResult<()> {
        debug!(
            "{} ({}): Configure {}",
            self.name,
            self.arm_type,
            config_file.display()
        );
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
        if interface != ROBOT_INTERFACE || command != SET_ROBOT_CONTROL_STATE {
            return Err(ExecutionError::UnknownCommand {
                interface: interface.to_string(),
                command: command.to_string(),
            });
        }
        let state = argument.trim();
        if state.is_empty() {
            let message = format!("{}: empty control state requested", self.name);
            events.emit(ROBOT_INTERFACE, MessageKind::Error, &message);
            return Err(ExecutionError::Rejected(message));
        }
        self.control_state = Some(state.to_string());
        events.emit(
            ROBOT_INTERFACE,
            MessageKind::Status,
            &format!("{}: control state {}", self.name, state),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rkit_core::{MessageEvent, MessageEvents};
    use tokio::sync::mpsc;

    fn robot_events() -> (ComponentEvents, mpsc::UnboundedReceiver<MessageEvent>) {
        let robot = MessageEvents::new();
        let (tx, rx) = mpsc::unbounded_channel();
        for kind in MessageKind::ALL {
            robot.subscribe(kind, tx.clone());
        }
        let events = ComponentEvents::new(HashMap::from([(ROBOT_INTERFACE.to_string(), robot)]));
        (events, rx)
    }

    #[test]
    fn test_state_change_emits_status() {
        let mut psm = SimArm::new("PSM1", ArmType::PatientSideManipulator, Duration::ZERO);
        let (events, mut rx) = robot_events();
        psm.execute(ROBOT_INTERFACE, SET_ROBOT_CONTROL_STATE, "READY", &events)
            .unwrap();
        assert_eq!(psm.control_state(), Some("READY"));
        assert_eq!(
            rx.try_recv().unwrap(),
            MessageEvent::status("PSM1: control state READY")
        );
    }

    #[test]
    fn test_empty_state_rejected_with_error_event() {
        let mut ecm = SimArm::new("ECM", ArmType::EndoscopeManipulator, Duration::ZERO);
        let (events, mut rx) = robot_events();
        let result = ecm.execute(ROBOT_INTERFACE, SET_ROBOT_CONTROL_STATE, "  ", &events);
        assert!(matches!(result, Err(ExecutionError::Rejected(_))));
        assert_eq!(ecm.control_state(), None);
        assert_eq!(rx.try_recv().unwrap().kind, MessageKind::Error);
    }

    #[test]
    fn test_required_interfaces_follow_arm_type() {
        let mtm = SimArm::new("MTML", ArmType::MasterManipulator, Duration::ZERO);
        assert_eq!(mtm.required_interfaces(), vec!["RobotIO", "PID"]);
        let ecm = SimArm::new("ECM", ArmType::EndoscopeManipulator, Duration::ZERO);
        assert_eq!(ecm.required_interfaces(), vec!["RobotIO", "PID", "ManipClutch"]);
    }
}
