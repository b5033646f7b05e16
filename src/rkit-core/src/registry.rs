// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Boundary to the component registry.
//!
//! The registry creates, names and connects components and routes their
//! command and event traffic. Callers receive a handle to it explicitly;
//! there is no process-wide instance.

use thiserror::Error;

use crate::arm::ComponentKind;
use crate::component::{Component, ComponentSpec};
use crate::interface::{Connection, Endpoint, RequiredInterface};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("component {0} is already registered")]
    DuplicateComponent(String),

    #[error("component {0} is not registered")]
    UnknownComponent(String),

    #[error("interface {0} does not exist")]
    UnknownInterface(Endpoint),

    #[error("interface {server} does not provide command {command}")]
    MissingCommand { server: Endpoint, command: String },

    #[error("required interface {client} is already connected")]
    AlreadyBound { client: Endpoint },

    #[error("no factory registered for {0}")]
    NoFactory(ComponentKind),

    #[error("failed to create component {name}: {reason}")]
    Creation { name: String, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

pub trait ComponentRegistry: Send + Sync {
    /// Build the component described by `spec`, load its configuration
    /// file and add it.
    fn create_component(&self, spec: &ComponentSpec) -> RegistryResult<()>;

    /// Add a component built by the caller.
    fn add_component(&self, component: Box<dyn Component>) -> RegistryResult<()>;

    fn contains(&self, name: &str) -> bool;

    /// Whether `server` names a provided interface of a registered component.
    fn provides(&self, server: &Endpoint) -> bool;

    /// Connect a required interface declared by a registered component to
    /// a provided interface of another.
    fn connect(&self, client: &Endpoint, server: &Endpoint) -> RegistryResult<()>;

    /// Connect a required interface owned by `client_component` (which need
    /// not be registered) to a provided interface. Binding is
    /// all-or-nothing: on error no function is bound and no handler
    /// subscribed.
    fn bind(
        &self,
        client_component: &str,
        required: &RequiredInterface,
        server: &Endpoint,
    ) -> RegistryResult<()>;

    /// Connections made so far, in order.
    fn connections(&self) -> Vec<Connection>;
}
