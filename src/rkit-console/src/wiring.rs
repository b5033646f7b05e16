// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Console-side endpoints of a registered arm.
//!
//! Each arm gets three required interfaces on the console: `IO<arm>` bound
//! to the IO component, `PID<arm>` bound to the control loop and `<arm>`
//! bound to the arm itself. All three forward Error, Warning and Status
//! events to the console's event queue; `<arm>` also carries the
//! `SetRobotControlState` function.

use std::collections::HashMap;

use tracing::{debug, warn};

use rkit_core::{
    ComponentRegistry, Endpoint, EventSink, FunctionWrite, MessageKind, RegistryError,
    RegistryResult, RequiredInterface, CONTROLLER_INTERFACE, ROBOT_INTERFACE,
    SET_ROBOT_CONTROL_STATE,
};

use crate::arm::ArmDescriptor;
use crate::error::WiringError;

pub const IO_PREFIX: &str = "IO";
pub const PID_PREFIX: &str = "PID";

/// Names of the console endpoints created for `arm`: IO, PID, then arm.
pub fn endpoint_names(arm: &str) -> [String; 3] {
    [
        format!("{}{}", IO_PREFIX, arm),
        format!("{}{}", PID_PREFIX, arm),
        arm.to_string(),
    ]
}

/// Create the console endpoints for `arm`, connect them and return the
/// bound `SetRobotControlState` function.
///
/// The arm endpoint must connect; the IO and control loop endpoints are
/// connected when their servers exist and skipped with a warning
/// otherwise. On error every endpoint created by this call is removed
/// from `endpoints`.
pub(crate) fn setup_and_connect_interfaces(
    console: &str,
    registry: &dyn ComponentRegistry,
    endpoints: &mut HashMap<String, RequiredInterface>,
    arm: &ArmDescriptor,
    event_sink: &EventSink,
) -> Result<FunctionWrite, WiringError> {
    let [io_name, pid_name, arm_name] = endpoint_names(arm.name());

    let mut arm_required = RequiredInterface::new(arm_name.as_str());
    let control_state = arm_required.add_function(SET_ROBOT_CONTROL_STATE);
    let candidates = [
        RequiredInterface::new(io_name.as_str()),
        RequiredInterface::new(pid_name.as_str()),
        arm_required,
    ];

    let mut created = Vec::with_capacity(candidates.len());
    for mut required in candidates {
        let name = required.name().to_string();
        if endpoints.contains_key(&name) {
            rollback(endpoints, &created);
            return Err(WiringError::EndpointExists(name));
        }
        for kind in MessageKind::ALL {
            required.add_event_handler(kind, event_sink.clone());
        }
        endpoints.insert(name.clone(), required);
        created.push(name);
    }

    // Bound first: a failure here leaves no subscription behind.
    let arm_server = Endpoint::new(arm.name(), ROBOT_INTERFACE);
    if let Err(source) = bind(console, registry, endpoints, &arm_name, &arm_server) {
        rollback(endpoints, &created);
        return Err(WiringError::Connect {
            endpoint: arm_name,
            source,
        });
    }

    let optional = [
        (
            &io_name,
            Endpoint::new(arm.io_component_name(), arm.name()),
        ),
        (
            &pid_name,
            Endpoint::new(arm.pid_component_name(), CONTROLLER_INTERFACE),
        ),
    ];
    for (client, server) in optional {
        if let Err(e) = bind(console, registry, endpoints, client, &server) {
            warn!("{}: {} left unconnected: {}", console, client, e);
        }
    }

    Ok(control_state)
}

fn bind(
    console: &str,
    registry: &dyn ComponentRegistry,
    endpoints: &HashMap<String, RequiredInterface>,
    client: &str,
    server: &Endpoint,
) -> RegistryResult<()> {
    match endpoints.get(client) {
        Some(required) => registry.bind(console, required, server),
        None => Err(RegistryError::UnknownInterface(Endpoint::new(console, client))),
    }
}

fn rollback(endpoints: &mut HashMap<String, RequiredInterface>, created: &[String]) {
    for name in created {
        endpoints.remove(name);
    }
    if !created.is_empty() {
        debug!("Removed endpoints {:?}", created);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rkit_components::SimArm;
    use rkit_core::{ArmType, MessageEvent};
    use tokio::sync::mpsc;

    use crate::arm::ArmProvisioning;
    use crate::testing::registry_with_io;

    fn configured_psm(registry: &dyn ComponentRegistry, name: &str) -> ArmDescriptor {
        let mut arm = ArmDescriptor::new(name, "io");
        arm.configure_control_loop(registry, "pid.json", Duration::from_millis(1))
            .unwrap();
        arm.configure_arm(
            registry,
            ArmType::PatientSideManipulator,
            "psm.json",
            Duration::ZERO,
            ArmProvisioning::Create,
        )
        .unwrap();
        arm
    }

    #[test]
    fn test_endpoint_names() {
        assert_eq!(endpoint_names("PSM1"), ["IOPSM1", "PIDPSM1", "PSM1"]);
    }

    #[test]
    fn test_wiring_connects_three_endpoints() {
        let registry = registry_with_io("io", &[("PSM1", ArmType::PatientSideManipulator)]);
        let arm = configured_psm(registry.as_ref(), "PSM1");
        let (sink, _events) = mpsc::unbounded_channel::<MessageEvent>();
        let mut endpoints = HashMap::new();

        let function =
            setup_and_connect_interfaces("console", registry.as_ref(), &mut endpoints, &arm, &sink)
                .unwrap();

        assert!(function.is_bound());
        assert_eq!(function.name(), "SetRobotControlState");
        assert_eq!(endpoints.len(), 3);
        for name in endpoint_names("PSM1") {
            let required = &endpoints[&name];
            assert_eq!(required.handlers().len(), 3);
            assert!(required.connected_to().is_some());
        }
        let connections: Vec<String> = registry
            .connections()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert!(connections.ends_with(&[
            "console:PSM1 -> PSM1:Robot".to_string(),
            "console:IOPSM1 -> io:PSM1".to_string(),
            "console:PIDPSM1 -> PSM1-PID:Controller".to_string(),
        ]));
    }

    #[test]
    fn test_missing_io_and_pid_are_tolerated() {
        let registry = crate::testing::registry_without_io();
        registry
            .add_component(Box::new(SimArm::new("EXT", ArmType::Generic, Duration::ZERO)))
            .unwrap();
        let arm = ArmDescriptor::external("EXT");
        let (sink, _events) = mpsc::unbounded_channel();
        let mut endpoints = HashMap::new();

        setup_and_connect_interfaces("console", registry.as_ref(), &mut endpoints, &arm, &sink)
            .unwrap();
        assert!(endpoints["EXT"].connected_to().is_some());
        assert!(endpoints["IOEXT"].connected_to().is_none());
        assert!(endpoints["PIDEXT"].connected_to().is_none());
    }

    #[test]
    fn test_existing_endpoint_rolls_back() {
        let registry = registry_with_io("io", &[("PSM1", ArmType::PatientSideManipulator)]);
        let arm = configured_psm(registry.as_ref(), "PSM1");
        let (sink, _events) = mpsc::unbounded_channel();
        let mut endpoints = HashMap::new();
        endpoints.insert("PIDPSM1".to_string(), RequiredInterface::new("PIDPSM1"));

        let err =
            setup_and_connect_interfaces("console", registry.as_ref(), &mut endpoints, &arm, &sink)
                .unwrap_err();
        assert_eq!(err, WiringError::EndpointExists("PIDPSM1".to_string()));
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints.contains_key("PIDPSM1"));
    }

    #[test]
    fn test_missing_arm_component_rolls_back() {
        let registry = registry_with_io("io", &[]);
        let arm = ArmDescriptor::external("GHOST");
        let (sink, _events) = mpsc::unbounded_channel();
        let mut endpoints = HashMap::new();

        let err =
            setup_and_connect_interfaces("console", registry.as_ref(), &mut endpoints, &arm, &sink)
                .unwrap_err();
        assert_eq!(
            err,
            WiringError::Connect {
                endpoint: "GHOST".to_string(),
                source: RegistryError::UnknownComponent("GHOST".to_string()),
            }
        );
        assert!(endpoints.is_empty());
        assert!(registry.connections().is_empty());
    }
}
