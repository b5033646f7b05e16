// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Arm classification and the component kinds it maps to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of a manipulator attached to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmType {
    #[serde(rename = "MTM")]
    MasterManipulator,
    #[serde(rename = "PSM")]
    PatientSideManipulator,
    #[serde(rename = "ECM")]
    EndoscopeManipulator,
    /// Arm component created outside the console.
    #[serde(rename = "GENERIC")]
    Generic,
}

// Interfaces shared by arms, control loops and IO components.
pub const ROBOT_INTERFACE: &str = "Robot";
pub const SET_ROBOT_CONTROL_STATE: &str = "SetRobotControlState";
pub const ROBOT_IO_INTERFACE: &str = "RobotIO";
pub const PID_INTERFACE: &str = "PID";
pub const CONTROLLER_INTERFACE: &str = "Controller";
pub const ENABLE_COMMAND: &str = "Enable";
pub const TORQUE_INTERFACE: &str = "RobotJointTorqueInterface";
pub const EXEC_IN_INTERFACE: &str = "ExecIn";
pub const EXEC_OUT_INTERFACE: &str = "ExecOut";

const PSM_AUXILIARY: &[&str] = &["Adapter", "Tool", "ManipClutch"];
const ECM_AUXILIARY: &[&str] = &["ManipClutch"];

impl ArmType {
    /// Research-kit arms get their functional and control-loop components
    /// created and linked by the console.
    pub fn is_research_kit(&self) -> bool {
        !matches!(self, Self::Generic)
    }

    /// Construction key for the functional component, if the console builds one.
    pub fn component_kind(&self) -> Option<ComponentKind> {
        match self {
            Self::MasterManipulator => Some(ComponentKind::MasterManipulator),
            Self::PatientSideManipulator => Some(ComponentKind::PatientSideManipulator),
            Self::EndoscopeManipulator => Some(ComponentKind::EndoscopeManipulator),
            Self::Generic => None,
        }
    }

    /// Extra arm-side required interfaces linked to `<arm>-<name>` on the
    /// IO component (tool, sterile adapter and clutch signals).
    pub fn auxiliary_interfaces(&self) -> &'static [&'static str] {
        match self {
            Self::PatientSideManipulator => PSM_AUXILIARY,
            Self::EndoscopeManipulator => ECM_AUXILIARY,
            Self::MasterManipulator | Self::Generic => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MasterManipulator => "MTM",
            Self::PatientSideManipulator => "PSM",
            Self::EndoscopeManipulator => "ECM",
            Self::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for ArmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MTM" => Ok(Self::MasterManipulator),
            "PSM" => Ok(Self::PatientSideManipulator),
            "ECM" => Ok(Self::EndoscopeManipulator),
            "GENERIC" => Ok(Self::Generic),
            other => Err(format!(
                "unknown arm type '{}' (expected one of: MTM, PSM, ECM, GENERIC)",
                other
            )),
        }
    }
}

/// Kinds of component the registry knows how to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    ControlLoop,
    MasterManipulator,
    PatientSideManipulator,
    EndoscopeManipulator,
}

impl ComponentKind {
    /// Arm type served by this kind, `None` for the control loop.
    pub fn arm_type(&self) -> Option<ArmType> {
        match self {
            Self::ControlLoop => None,
            Self::MasterManipulator => Some(ArmType::MasterManipulator),
            Self::PatientSideManipulator => Some(ArmType::PatientSideManipulator),
            Self::EndoscopeManipulator => Some(ArmType::EndoscopeManipulator),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ControlLoop => write!(f, "control-loop"),
            Self::MasterManipulator => write!(f, "MTM"),
            Self::PatientSideManipulator => write!(f, "PSM"),
            Self::EndoscopeManipulator => write!(f, "ECM"),
        }
    }
}
