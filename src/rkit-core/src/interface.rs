// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Provided/required interface model.
//!
//! A provided interface exposes commands (served by the owning component's
//! request queue) and the `Error`/`Warning`/`Status` message events. A
//! required interface holds function handles and event handlers which the
//! registry binds to exactly one provided interface.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::execution::{ExecutionError, ExecutionResult};

/// The three diagnostic event channels every interface carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Error,
    Warning,
    Status,
}

impl MessageKind {
    pub const ALL: [MessageKind; 3] = [MessageKind::Error, MessageKind::Warning, MessageKind::Status];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Status => "Status",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub kind: MessageKind,
    pub message: String,
}

impl MessageEvent {
    pub fn new(kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(MessageKind::Warning, message)
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(MessageKind::Status, message)
    }
}

/// Queue an event handler delivers into.
pub type EventSink = mpsc::UnboundedSender<MessageEvent>;

/// Handler for one event of the peer interface.
#[derive(Debug, Clone)]
pub struct EventHandler {
    pub event: MessageKind,
    pub sink: EventSink,
}

/// Event generators of one provided interface.
#[derive(Debug, Clone, Default)]
pub struct MessageEvents {
    handlers: Arc<Mutex<HashMap<MessageKind, Vec<EventSink>>>>,
}

impl MessageEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: MessageKind, sink: EventSink) {
        let mut handlers = self.handlers.lock().expect("event handlers mutex poisoned");
        handlers.entry(event).or_default().push(sink);
    }

    /// Deliver `message` once to every handler subscribed to `kind`.
    /// Returns the number of handlers reached.
    pub fn emit(&self, kind: MessageKind, message: &str) -> usize {
        let mut handlers = self.handlers.lock().expect("event handlers mutex poisoned");
        let Some(sinks) = handlers.get_mut(&kind) else {
            return 0;
        };
        let before = sinks.len();
        sinks.retain(|sink| sink.send(MessageEvent::new(kind, message)).is_ok());
        if sinks.len() != before {
            debug!("Dropped {} closed {} handler(s)", before - sinks.len(), kind);
        }
        sinks.len()
    }

    pub fn error(&self, message: &str) -> usize {
        self.emit(MessageKind::Error, message)
    }

    pub fn warning(&self, message: &str) -> usize {
        self.emit(MessageKind::Warning, message)
    }

    pub fn status(&self, message: &str) -> usize {
        self.emit(MessageKind::Status, message)
    }

    pub fn handler_count(&self, kind: MessageKind) -> usize {
        let handlers = self.handlers.lock().expect("event handlers mutex poisoned");
        handlers.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

/// Interface name qualified by its component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub component: String,
    pub interface: String,
}

impl Endpoint {
    pub fn new(component: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            interface: interface.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.component, self.interface)
    }
}

/// A required interface bound to a provided one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub client: Endpoint,
    pub server: Endpoint,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.client, self.server)
    }
}

/// Request sent to the component owning a provided interface.
#[derive(Debug)]
pub struct CommandRequest {
    pub interface: String,
    pub command: String,
    pub argument: String,
    pub respond_to: oneshot::Sender<ExecutionResult>,
}

#[derive(Debug, Clone)]
pub struct ProvidedInterface {
    component: String,
    name: String,
    commands: Vec<String>,
    requests: mpsc::Sender<CommandRequest>,
    events: MessageEvents,
}

impl ProvidedInterface {
    pub fn new(
        component: impl Into<String>,
        name: impl Into<String>,
        commands: Vec<String>,
        requests: mpsc::Sender<CommandRequest>,
    ) -> Self {
        Self {
            component: component.into(),
            name: name.into(),
            commands,
            requests,
            events: MessageEvents::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.component, &self.name)
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn provides(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }

    pub fn events(&self) -> &MessageEvents {
        &self.events
    }
}

#[derive(Debug, Clone)]
struct CommandTarget {
    component: String,
    interface: String,
    requests: mpsc::Sender<CommandRequest>,
}

/// Invocable handle to a command of the peer interface.
///
/// Clones share the binding: once the registry binds one copy, every copy
/// delivers to the live component.
#[derive(Debug, Clone)]
pub struct FunctionWrite {
    name: String,
    target: Arc<OnceLock<CommandTarget>>,
}

impl FunctionWrite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: Arc::new(OnceLock::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }

    /// Bind to the matching command of `provided`. Returns false when the
    /// handle was already bound.
    pub fn bind(&self, provided: &ProvidedInterface) -> bool {
        self.target
            .set(CommandTarget {
                component: provided.component.clone(),
                interface: provided.name.clone(),
                requests: provided.requests.clone(),
            })
            .is_ok()
    }

    /// Invoke the bound command and wait for the component's result.
    pub async fn call(&self, argument: impl Into<String>) -> ExecutionResult {
        let Some(target) = self.target.get() else {
            return Err(ExecutionError::NotBound(self.name.clone()));
        };
        let (respond_to, response) = oneshot::channel();
        let request = CommandRequest {
            interface: target.interface.clone(),
            command: self.name.clone(),
            argument: argument.into(),
            respond_to,
        };
        target
            .requests
            .send(request)
            .await
            .map_err(|_| ExecutionError::Disconnected(target.component.clone()))?;
        response
            .await
            .map_err(|_| ExecutionError::Disconnected(target.component.clone()))?
    }
}

#[derive(Debug, Clone)]
pub struct RequiredInterface {
    name: String,
    functions: Vec<FunctionWrite>,
    handlers: Vec<EventHandler>,
    connected: Arc<OnceLock<Endpoint>>,
}

impl RequiredInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            handlers: Vec::new(),
            connected: Arc::new(OnceLock::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a function to bind; the returned handle becomes invocable
    /// once the interface is connected.
    pub fn add_function(&mut self, name: impl Into<String>) -> FunctionWrite {
        let function = FunctionWrite::new(name);
        self.functions.push(function.clone());
        function
    }

    pub fn add_event_handler(&mut self, event: MessageKind, sink: EventSink) {
        self.handlers.push(EventHandler { event, sink });
    }

    pub fn functions(&self) -> &[FunctionWrite] {
        &self.functions
    }

    pub fn handlers(&self) -> &[EventHandler] {
        &self.handlers
    }

    pub fn connected_to(&self) -> Option<&Endpoint> {
        self.connected.get()
    }

    /// Record the peer. Returns false when already connected.
    pub fn mark_connected(&self, server: Endpoint) -> bool {
        self.connected.set(server).is_ok()
    }
}
