// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Arm descriptors: naming, configuration and component setup for one arm.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use rkit_core::{
    ArmType, ComponentKind, ComponentRegistry, ComponentSpec, Endpoint, FunctionWrite,
    RegistryError, CONTROLLER_INTERFACE, EXEC_IN_INTERFACE, EXEC_OUT_INTERFACE, PID_INTERFACE,
    ROBOT_IO_INTERFACE, TORQUE_INTERFACE,
};

use crate::error::ArmError;

/// Period used for a control loop configured with a zero period.
pub const DEFAULT_CONTROL_LOOP_PERIOD: Duration = Duration::from_secs(1);

pub const PID_SUFFIX: &str = "-PID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmStage {
    Created,
    ControlLoopConfigured,
    ArmConfigured,
    Registered,
}

/// Whether `configure_arm` creates the arm component or uses one already
/// added to the registry under the arm's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmProvisioning {
    Create,
    Existing,
}

#[derive(Debug)]
pub struct ArmDescriptor {
    name: String,
    io_component_name: String,
    arm_type: ArmType,
    pid_config_file: PathBuf,
    arm_config_file: PathBuf,
    stage: ArmStage,
    control_state: Option<FunctionWrite>,
}

impl ArmDescriptor {
    pub fn new(name: &str, io_component_name: &str) -> Self {
        Self {
            name: name.to_string(),
            io_component_name: io_component_name.to_string(),
            arm_type: ArmType::Generic,
            pid_config_file: PathBuf::new(),
            arm_config_file: PathBuf::new(),
            stage: ArmStage::Created,
            control_state: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn io_component_name(&self) -> &str {
        &self.io_component_name
    }

    pub fn pid_component_name(&self) -> String {
        format!("{}{}", self.name, PID_SUFFIX)
    }

    pub fn arm_type(&self) -> ArmType {
        self.arm_type
    }

    pub fn stage(&self) -> ArmStage {
        self.stage
    }

    pub fn pid_config_file(&self) -> &Path {
        &self.pid_config_file
    }

    pub fn arm_config_file(&self) -> &Path {
        &self.arm_config_file
    }

    /// Both configuration files are known.
    pub fn is_configured(&self) -> bool {
        !self.pid_config_file.as_os_str().is_empty() && !self.arm_config_file.as_os_str().is_empty()
    }

    /// The console's `SetRobotControlState` function for this arm, bound
    /// once the arm is registered.
    pub fn control_state_function(&self) -> Option<&FunctionWrite> {
        self.control_state.as_ref()
    }

    /// Create the arm's control loop and link it to the IO component.
    ///
    /// A zero `period` makes the loop follow the IO component's cycle: it
    /// runs at [`DEFAULT_CONTROL_LOOP_PERIOD`] and its `ExecIn` trigger is
    /// connected to the IO `ExecOut` signal.
    pub fn configure_control_loop(
        &mut self,
        registry: &dyn ComponentRegistry,
        config_file: impl AsRef<Path>,
        period: Duration,
    ) -> Result<(), ArmError> {
        self.expect_stage(ArmStage::Created, "configure_control_loop")?;
        let config_file = config_file.as_ref();
        let signal_driven = period.is_zero();
        let pid_name = self.pid_component_name();

        let mut links = vec![(
            Endpoint::new(&pid_name, TORQUE_INTERFACE),
            Endpoint::new(&self.io_component_name, &self.name),
        )];
        if signal_driven {
            links.push((
                Endpoint::new(&pid_name, EXEC_IN_INTERFACE),
                Endpoint::new(&self.io_component_name, EXEC_OUT_INTERFACE),
            ));
        }
        self.check_servers(registry, &links)?;

        registry
            .create_component(&ComponentSpec {
                kind: ComponentKind::ControlLoop,
                name: pid_name.clone(),
                period: if signal_driven {
                    DEFAULT_CONTROL_LOOP_PERIOD
                } else {
                    period
                },
                config_file: config_file.to_path_buf(),
            })
            .map_err(|e| self.registry_error(e))?;
        self.link_all(registry, &links)?;

        debug!(
            "{}: control loop {} configured from {}",
            self.name,
            pid_name,
            config_file.display()
        );
        self.pid_config_file = config_file.to_path_buf();
        self.stage = ArmStage::ControlLoopConfigured;
        Ok(())
    }

    /// Set the arm type and, for research-kit arms, set up and link the arm
    /// component. Generic arms only record their configuration file.
    pub fn configure_arm(
        &mut self,
        registry: &dyn ComponentRegistry,
        arm_type: ArmType,
        config_file: impl AsRef<Path>,
        period: Duration,
        provisioning: ArmProvisioning,
    ) -> Result<(), ArmError> {
        self.expect_stage(ArmStage::ControlLoopConfigured, "configure_arm")?;
        let config_file = config_file.as_ref();

        if let Some(kind) = arm_type.component_kind() {
            let mut links: Vec<(Endpoint, Endpoint)> = arm_type
                .auxiliary_interfaces()
                .iter()
                .map(|aux| {
                    (
                        Endpoint::new(&self.name, *aux),
                        Endpoint::new(&self.io_component_name, format!("{}-{}", self.name, aux)),
                    )
                })
                .collect();
            links.push((
                Endpoint::new(&self.name, ROBOT_IO_INTERFACE),
                Endpoint::new(&self.io_component_name, &self.name),
            ));
            links.push((
                Endpoint::new(&self.name, PID_INTERFACE),
                Endpoint::new(self.pid_component_name(), CONTROLLER_INTERFACE),
            ));
            self.check_servers(registry, &links)?;

            if provisioning == ArmProvisioning::Create {
                registry
                    .create_component(&ComponentSpec {
                        kind,
                        name: self.name.clone(),
                        period,
                        config_file: config_file.to_path_buf(),
                    })
                    .map_err(|e| self.registry_error(e))?;
            }
            self.link_all(registry, &links)?;
        }

        debug!(
            "{} ({}): configured from {}",
            self.name,
            arm_type,
            config_file.display()
        );
        self.arm_type = arm_type;
        self.arm_config_file = config_file.to_path_buf();
        self.stage = ArmStage::ArmConfigured;
        Ok(())
    }

    /// Descriptor for an arm component supplied by the caller, registered
    /// without control loop or configuration files.
    pub(crate) fn external(name: &str) -> Self {
        Self::new(name, "")
    }

    pub(crate) fn mark_registered(&mut self, control_state: FunctionWrite) {
        self.control_state = Some(control_state);
        self.stage = ArmStage::Registered;
    }

    /// Every link target must exist before a component is created, so a
    /// failed step leaves the registry unchanged and can be run again.
    fn check_servers(
        &self,
        registry: &dyn ComponentRegistry,
        links: &[(Endpoint, Endpoint)],
    ) -> Result<(), ArmError> {
        for (_, server) in links {
            if !registry.contains(&server.component) {
                return Err(self.registry_error(RegistryError::UnknownComponent(
                    server.component.clone(),
                )));
            }
            if !registry.provides(server) {
                return Err(self.registry_error(RegistryError::UnknownInterface(server.clone())));
            }
        }
        Ok(())
    }

    fn link_all(
        &self,
        registry: &dyn ComponentRegistry,
        links: &[(Endpoint, Endpoint)],
    ) -> Result<(), ArmError> {
        for (client, server) in links {
            registry
                .connect(client, server)
                .map_err(|e| self.registry_error(e))?;
        }
        Ok(())
    }

    fn expect_stage(&self, expected: ArmStage, operation: &'static str) -> Result<(), ArmError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ArmError::OutOfOrder {
                arm: self.name.clone(),
                operation,
                stage: self.stage,
            })
        }
    }

    fn registry_error(&self, source: RegistryError) -> ArmError {
        ArmError::Registry {
            arm: self.name.clone(),
            source,
        }
    }

    #[cfg(test)]
    pub(crate) fn preconfigured(name: &str, io_component_name: &str, arm_type: ArmType) -> Self {
        let mut arm = Self::new(name, io_component_name);
        arm.arm_type = arm_type;
        arm.pid_config_file = PathBuf::from(format!("{}-pid.json", name.to_lowercase()));
        arm.arm_config_file = PathBuf::from(format!("{}.json", name.to_lowercase()));
        arm.stage = ArmStage::ArmConfigured;
        arm
    }
}
