// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Populate a registry and console from the loaded configuration.

use rkit_components::{SimArm, SimIo};
use rkit_core::{Component, ComponentRegistry, RegistryError, RegistryResult};
use tracing::{error, info};

use crate::arm::{ArmDescriptor, ArmProvisioning};
use crate::config::{ArmConfig, ConsoleConfig};
use crate::console::Console;
use crate::error::ArmError;

/// Add one IO component per `[[io]]` entry with the interfaces of the arms
/// attached to it.
pub fn add_io_components(
    config: &ConsoleConfig,
    registry: &dyn ComponentRegistry,
) -> RegistryResult<()> {
    for io in &config.io {
        let mut driver = SimIo::new(&io.name, io.period());
        for arm in config.arms_on_io(&io.name) {
            driver = driver.with_robot(&arm.name, arm.arm_type);
        }
        if let Some(path) = &io.config_file {
            driver
                .configure(path)
                .map_err(|e| RegistryError::Creation {
                    name: io.name.clone(),
                    reason: e.to_string(),
                })?;
        }
        registry.add_component(Box::new(driver))?;
    }
    Ok(())
}

/// Configure and register every `[[arms]]` entry in order. An arm that
/// fails is logged and skipped. Returns the number of registered arms.
pub fn setup_arms(
    config: &ConsoleConfig,
    registry: &dyn ComponentRegistry,
    console: &mut Console,
) -> usize {
    for arm in &config.arms {
        let result = if arm.external {
            add_external(arm, registry, console)
        } else {
            match configure(arm, registry) {
                Ok(descriptor) => console.add_arm(descriptor).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            }
        };
        if let Err(e) = result {
            error!("Arm {} not added: {}", arm.name, e);
        }
    }
    info!(
        "{}: {} of {} arm(s) registered",
        console.name(),
        console.arm_count(),
        config.arms.len()
    );
    console.arm_count()
}

fn configure(arm: &ArmConfig, registry: &dyn ComponentRegistry) -> Result<ArmDescriptor, ArmError> {
    let mut descriptor = ArmDescriptor::new(&arm.name, &arm.io);
    descriptor.configure_control_loop(registry, &arm.pid.config_file, arm.pid.period())?;
    descriptor.configure_arm(
        registry,
        arm.arm_type,
        &arm.config_file,
        arm.period(),
        ArmProvisioning::Create,
    )?;
    Ok(descriptor)
}

/// External arms run outside the console; a simulated stand-in takes
/// their place in the local registry.
fn add_external(
    arm: &ArmConfig,
    registry: &dyn ComponentRegistry,
    console: &mut Console,
) -> Result<(), String> {
    if !registry.contains(&arm.name) {
        registry
            .add_component(Box::new(SimArm::new(&arm.name, arm.arm_type, arm.period())))
            .map_err(|e| e.to_string())?;
    }
    console
        .add_external_arm(&arm.name)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    use crate::testing::registry_without_io;

    fn config(content: &str) -> ConsoleConfig {
        let config: ConsoleConfig = toml::from_str(content).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_setup_from_config() {
        let config = config(
            r#"
[[io]]
name = "io"

[[arms]]
name = "PSM1"
type = "PSM"
io = "io"
config_file = "psm.json"

[arms.pid]
config_file = "pid.xml"

[[arms]]
name = "SUJ"
type = "GENERIC"
external = true
"#,
        );
        let registry = registry_without_io();
        add_io_components(&config, registry.as_ref()).unwrap();
        let (events, _) = broadcast::channel(16);
        let mut console = Console::new("console", registry.clone(), events);

        assert_eq!(setup_arms(&config, registry.as_ref(), &mut console), 2);
        assert_eq!(console.arm_names(), vec!["PSM1", "SUJ"]);
        assert_eq!(
            registry.component_names(),
            vec!["io", "PSM1-PID", "PSM1", "SUJ"]
        );
    }

    #[test]
    fn test_unconfigured_arm_skipped() {
        let config = config(
            r#"
[[io]]
name = "io"

[[arms]]
name = "MTML"
type = "MTM"
io = "io"

[[arms]]
name = "MTMR"
type = "MTM"
io = "io"
config_file = "mtmr.json"

[arms.pid]
config_file = "pid.xml"
"#,
        );
        let registry = registry_without_io();
        add_io_components(&config, registry.as_ref()).unwrap();
        let (events, _) = broadcast::channel(16);
        let mut console = Console::new("console", registry.clone(), events);

        assert_eq!(setup_arms(&config, registry.as_ref(), &mut console), 1);
        assert_eq!(console.arm_names(), vec!["MTMR"]);
    }
}
