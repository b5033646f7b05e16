// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Console orchestrating the arms of a research-kit rig.
//!
//! Arms are described and configured through [`ArmDescriptor`], registered
//! on a [`Console`] and driven by [`run_console_task`]. Callers talk to a
//! running console through a [`ConsoleHandle`].

pub mod arm;
pub mod config;
pub mod console;
pub mod console_handle;
pub mod console_task;
pub mod error;
pub mod setup;
pub mod wiring;

#[cfg(test)]
mod testing;

pub use arm::{ArmDescriptor, ArmProvisioning, ArmStage};
pub use config::ConsoleConfig;
pub use console::{Console, DeliveryFailure};
pub use console_handle::{log_events, ConsoleHandle, CONSOLE_QUEUE_SIZE, EVENT_BUFFER};
pub use console_task::{run_console_task, ConsoleCommand};
pub use error::{ArmError, ConsoleError, RegistrationError, WiringError};
