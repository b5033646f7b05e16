// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for rkit-console.
//!
//! Config is loaded from the `[rkit-console]` section of `rkit.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./rkit.toml`
//! 3. `~/.config/rkit/rkit.toml`
//! 4. `/etc/rkit/rkit.toml`

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rkit_app::ConfigFile;
use rkit_core::ArmType;

/// Top-level console configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// General settings
    pub general: GeneralConfig,
    /// The console component itself
    pub console: ConsoleSection,
    /// IO components, one per `[[io]]` entry
    pub io: Vec<IoConfig>,
    /// Arms, registered in the order listed
    pub arms: Vec<ArmConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSection {
    /// Component name of the console
    pub name: String,
    /// Period of the console's housekeeping tick; absent or 0 wakes only
    /// on commands and events
    pub period_ms: Option<u64>,
    /// Configuration file handed to the console's configure step
    pub config_file: Option<PathBuf>,
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            period_ms: None,
            config_file: None,
        }
    }
}

impl ConsoleSection {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    pub name: String,
    /// IO cycle period in milliseconds
    pub period_ms: u64,
    pub config_file: Option<PathBuf>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            name: "io".to_string(),
            period_ms: 1,
            config_file: None,
        }
    }
}

impl IoConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// One `[[arms]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmConfig {
    pub name: String,
    /// MTM, PSM, ECM or GENERIC
    #[serde(rename = "type")]
    pub arm_type: ArmType,
    /// Name of the IO component the arm is attached to
    #[serde(default)]
    pub io: String,
    #[serde(default)]
    pub config_file: PathBuf,
    #[serde(default)]
    pub period_ms: u64,
    #[serde(default)]
    pub pid: PidConfig,
    /// The arm component is supplied outside the console: no control loop,
    /// no configuration files
    #[serde(default)]
    pub external: bool,
}

impl ArmConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub config_file: PathBuf,
    /// Control loop period in milliseconds; 0 follows the IO cycle
    pub period_ms: u64,
}

impl PidConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl ConsoleConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if self.console.name.trim().is_empty() {
            return Err("[console].name must not be empty".to_string());
        }

        let mut io_names = HashSet::new();
        for io in &self.io {
            if io.name.trim().is_empty() {
                return Err("[[io]].name must not be empty".to_string());
            }
            if !io_names.insert(io.name.as_str()) {
                return Err(format!("[[io]] '{}' is defined more than once", io.name));
            }
        }

        let mut arm_names = HashSet::new();
        for arm in &self.arms {
            if arm.name.trim().is_empty() {
                return Err("[[arms]].name must not be empty".to_string());
            }
            if !arm_names.insert(arm.name.as_str()) {
                return Err(format!("[[arms]] '{}' is defined more than once", arm.name));
            }
            if io_names.contains(arm.name.as_str()) || arm.name == self.console.name {
                return Err(format!(
                    "[[arms]] '{}' clashes with another component name",
                    arm.name
                ));
            }
            if arm.external {
                continue;
            }
            if !arm.arm_type.is_research_kit() {
                return Err(format!(
                    "[[arms]] '{}' of type {} must be external",
                    arm.name, arm.arm_type
                ));
            }
            if !io_names.contains(arm.io.as_str()) {
                return Err(format!(
                    "[[arms]] '{}' references unknown io '{}'",
                    arm.name, arm.io
                ));
            }
        }

        Ok(())
    }

    /// Arms attached to the IO component `io`, in configuration order.
    pub fn arms_on_io<'a>(&'a self, io: &'a str) -> impl Iterator<Item = &'a ArmConfig> + 'a {
        self.arms
            .iter()
            .filter(move |arm| !arm.external && arm.io == io)
    }

    /// Return an example configuration as a TOML string.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "rkit-console")]
            inner: ConsoleConfig,
        }
        let example = ConsoleConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            console: ConsoleSection::default(),
            io: vec![IoConfig {
                name: "io".to_string(),
                period_ms: 1,
                config_file: Some(PathBuf::from("sawRobotIO1394-PSM1.xml")),
            }],
            arms: vec![
                ArmConfig {
                    name: "PSM1".to_string(),
                    arm_type: ArmType::PatientSideManipulator,
                    io: "io".to_string(),
                    config_file: PathBuf::from("dvpsm.json"),
                    period_ms: 3,
                    pid: PidConfig {
                        config_file: PathBuf::from("sawControllersPID-PSM.xml"),
                        period_ms: 0,
                    },
                    external: false,
                },
                ArmConfig {
                    name: "SUJ".to_string(),
                    arm_type: ArmType::Generic,
                    io: String::new(),
                    config_file: PathBuf::new(),
                    period_ms: 0,
                    pid: PidConfig::default(),
                    external: true,
                },
            ],
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

impl ConfigFile for ConsoleConfig {
    fn section_key() -> &'static str {
        "rkit-console"
    }
}
