// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod arm;
pub mod component;
pub mod execution;
pub mod interface;
pub mod registry;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use arm::{
    ArmType, ComponentKind, CONTROLLER_INTERFACE, ENABLE_COMMAND, EXEC_IN_INTERFACE,
    EXEC_OUT_INTERFACE, PID_INTERFACE, ROBOT_INTERFACE, ROBOT_IO_INTERFACE, SET_ROBOT_CONTROL_STATE,
    TORQUE_INTERFACE,
};
pub use component::{Component, ComponentEvents, ComponentSpec, ProvidedSpec};
pub use execution::{ExecutionError, ExecutionResult};
pub use interface::{
    CommandRequest, Connection, Endpoint, EventHandler, EventSink, FunctionWrite, MessageEvent,
    MessageEvents, MessageKind, ProvidedInterface, RequiredInterface,
};
pub use registry::{ComponentRegistry, RegistryError, RegistryResult};
