// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

use rkit_core::RegistryError;

use crate::arm::ArmStage;

/// Failure while configuring an arm descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArmError {
    #[error("{arm}: {operation} is not allowed in stage {stage:?}")]
    OutOfOrder {
        arm: String,
        operation: &'static str,
        stage: ArmStage,
    },

    #[error("{arm}: {source}")]
    Registry {
        arm: String,
        #[source]
        source: RegistryError,
    },
}

/// Failure while creating or connecting the console's endpoints for an arm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiringError {
    #[error("required interface {0} already exists")]
    EndpointExists(String),

    #[error("unable to connect {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: RegistryError,
    },
}

/// Why an arm was not added to the console.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{0} must be configured first (control loop and arm config files)")]
    NotConfigured(String),

    #[error("unable to add arm {arm}, are you adding two arms with the same name? ({source})")]
    Wiring {
        arm: String,
        #[source]
        source: WiringError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("console {0} is not running")]
    Stopped(String),
}
