// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! In-process component registry.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rkit_core::{
    CommandRequest, Component, ComponentEvents, ComponentRegistry, ComponentSpec, Connection,
    Endpoint, ProvidedInterface, RegistryError, RegistryResult, RequiredInterface,
};

use crate::task::run_component_task;
use crate::RegistrationContext;

const COMPONENT_QUEUE_SIZE: usize = 64;

struct PendingStart {
    component: Box<dyn Component>,
    requests: mpsc::Receiver<CommandRequest>,
}

struct ComponentEntry {
    provided: HashMap<String, ProvidedInterface>,
    required: HashMap<String, RequiredInterface>,
    pending: Option<PendingStart>,
}

#[derive(Default)]
struct Inner {
    components: HashMap<String, ComponentEntry>,
    order: Vec<String>,
    connections: Vec<Connection>,
    tasks: Vec<JoinHandle<()>>,
}

/// Registry running every component on its own tokio task.
///
/// Components are added (and connected) before `start`; requests sent to
/// a component before it starts wait in its queue.
pub struct LocalRegistry {
    factories: RegistrationContext,
    inner: Mutex<Inner>,
    shutdown_tx: watch::Sender<bool>,
}

impl LocalRegistry {
    pub fn new(factories: RegistrationContext) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            factories,
            inner: Mutex::new(Inner::default()),
            shutdown_tx,
        }
    }

    /// Component names in registration order.
    pub fn component_names(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner.order.clone()
    }

    /// Spawn a task for every component added since the last call.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> usize {
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        let Inner {
            components,
            order,
            tasks,
            ..
        } = &mut *inner;

        let mut started = 0;
        for name in order.iter() {
            let Some(entry) = components.get_mut(name) else {
                continue;
            };
            let Some(PendingStart {
                component,
                requests,
            }) = entry.pending.take()
            else {
                continue;
            };
            let events = ComponentEvents::new(
                entry
                    .provided
                    .iter()
                    .map(|(iface, provided)| (iface.clone(), provided.events().clone()))
                    .collect(),
            );
            tasks.push(tokio::spawn(run_component_task(
                component,
                requests,
                events,
                self.shutdown_tx.subscribe(),
            )));
            started += 1;
        }
        if started > 0 {
            info!("Started {} component(s)", started);
        }
        started
    }

    /// Stop every component task and wait for its cleanup.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let tasks = {
            let mut inner = self.inner.lock().expect("registry mutex poisoned");
            std::mem::take(&mut inner.tasks)
        };
        for handle in tasks {
            if let Err(e) = handle.await {
                warn!("Component task ended abnormally: {}", e);
            }
        }
    }

    fn bind_locked(
        inner: &mut Inner,
        client: Endpoint,
        required: &RequiredInterface,
        server: &Endpoint,
    ) -> RegistryResult<()> {
        let provided = inner
            .components
            .get(&server.component)
            .ok_or_else(|| RegistryError::UnknownComponent(server.component.clone()))?
            .provided
            .get(&server.interface)
            .ok_or_else(|| RegistryError::UnknownInterface(server.clone()))?;

        for function in required.functions() {
            if !provided.provides(function.name()) {
                return Err(RegistryError::MissingCommand {
                    server: server.clone(),
                    command: function.name().to_string(),
                });
            }
        }
        if required.functions().iter().any(|f| f.is_bound())
            || !required.mark_connected(server.clone())
        {
            return Err(RegistryError::AlreadyBound { client });
        }

        for function in required.functions() {
            function.bind(provided);
        }
        for handler in required.handlers() {
            provided.events().subscribe(handler.event, handler.sink.clone());
        }

        debug!("Connected {} -> {}", client, server);
        inner.connections.push(Connection {
            client,
            server: server.clone(),
        });
        Ok(())
    }
}

impl ComponentRegistry for LocalRegistry {
    fn create_component(&self, spec: &ComponentSpec) -> RegistryResult<()> {
        if !self.factories.is_registered(spec.kind) {
            return Err(RegistryError::NoFactory(spec.kind));
        }
        if self.contains(&spec.name) {
            return Err(RegistryError::DuplicateComponent(spec.name.clone()));
        }
        let creation_error = |e: Box<dyn std::error::Error + Send + Sync>| RegistryError::Creation {
            name: spec.name.clone(),
            reason: e.to_string(),
        };
        let mut component = self.factories.build(spec).map_err(creation_error)?;
        component
            .configure(&spec.config_file)
            .map_err(creation_error)?;
        self.add_component(component)
    }

    fn add_component(&self, component: Box<dyn Component>) -> RegistryResult<()> {
        let name = component.name().to_string();
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        if inner.components.contains_key(&name) {
            return Err(RegistryError::DuplicateComponent(name));
        }

        let (requests_tx, requests_rx) = mpsc::channel(COMPONENT_QUEUE_SIZE);
        let provided = component
            .provided_interfaces()
            .into_iter()
            .map(|spec| {
                let iface =
                    ProvidedInterface::new(&name, spec.name.clone(), spec.commands, requests_tx.clone());
                (spec.name, iface)
            })
            .collect();
        let required = component
            .required_interfaces()
            .into_iter()
            .map(|iface| (iface.clone(), RequiredInterface::new(iface)))
            .collect();

        inner.components.insert(
            name.clone(),
            ComponentEntry {
                provided,
                required,
                pending: Some(PendingStart {
                    component,
                    requests: requests_rx,
                }),
            },
        );
        inner.order.push(name.clone());
        info!("Added component {}", name);
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner.components.contains_key(name)
    }

    fn provides(&self, server: &Endpoint) -> bool {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner
            .components
            .get(&server.component)
            .is_some_and(|entry| entry.provided.contains_key(&server.interface))
    }

    fn connect(&self, client: &Endpoint, server: &Endpoint) -> RegistryResult<()> {
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        let required = inner
            .components
            .get(&client.component)
            .ok_or_else(|| RegistryError::UnknownComponent(client.component.clone()))?
            .required
            .get(&client.interface)
            .ok_or_else(|| RegistryError::UnknownInterface(client.clone()))?
            .clone();
        Self::bind_locked(&mut inner, client.clone(), &required, server)
    }

    fn bind(
        &self,
        client_component: &str,
        required: &RequiredInterface,
        server: &Endpoint,
    ) -> RegistryResult<()> {
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        let client = Endpoint::new(client_component, required.name());
        Self::bind_locked(&mut inner, client, required, server)
    }

    fn connections(&self) -> Vec<Connection> {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner.connections.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use rkit_core::{
        ArmType, ComponentKind, ExecutionError, MessageEvent, MessageKind,
    };

    use crate::{register_builtin_components_on, SimArm, SimIo};

    fn registry() -> LocalRegistry {
        let mut context = RegistrationContext::new();
        register_builtin_components_on(&mut context);
        LocalRegistry::new(context)
    }

    fn arm_spec(name: &str) -> ComponentSpec {
        ComponentSpec {
            kind: ComponentKind::PatientSideManipulator,
            name: name.to_string(),
            period: Duration::ZERO,
            config_file: PathBuf::from("psm.json"),
        }
    }

    struct CleanupTracker {
        cleaned: Arc<Mutex<bool>>,
    }

    impl Component for CleanupTracker {
        fn name(&self) -> &str {
            "tracker"
        }

        fn provided_interfaces(&self) -> Vec<rkit_core::ProvidedSpec> {
            Vec::new()
        }

        fn configure(&mut self, _config_file: &std::path::Path) -> rkit_core::DynResult<()> {
            Ok(())
        }

        fn execute(
            &mut self,
            _interface: &str,
            _command: &str,
            _argument: &str,
            _events: &ComponentEvents,
        ) -> rkit_core::ExecutionResult {
            Ok(())
        }

        fn cleanup(&mut self) {
            *self.cleaned.lock().unwrap() = true;
        }
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let registry = registry();
        registry.create_component(&arm_spec("PSM1")).unwrap();
        assert_eq!(
            registry.create_component(&arm_spec("PSM1")),
            Err(RegistryError::DuplicateComponent("PSM1".to_string()))
        );
        let again = SimArm::new("PSM1", ArmType::PatientSideManipulator, Duration::ZERO);
        assert_eq!(
            registry.add_component(Box::new(again)),
            Err(RegistryError::DuplicateComponent("PSM1".to_string()))
        );
        assert_eq!(registry.component_names(), vec!["PSM1"]);
    }

    #[test]
    fn test_missing_factory() {
        let registry = LocalRegistry::new(RegistrationContext::new());
        assert_eq!(
            registry.create_component(&arm_spec("PSM1")),
            Err(RegistryError::NoFactory(ComponentKind::PatientSideManipulator))
        );
        assert!(!registry.contains("PSM1"));
    }

    #[test]
    fn test_connect_records_connection() {
        let registry = registry();
        registry.create_component(&arm_spec("PSM1")).unwrap();
        registry
            .add_component(Box::new(
                SimIo::new("io", Duration::ZERO).with_robot("PSM1", ArmType::PatientSideManipulator),
            ))
            .unwrap();

        let client = Endpoint::new("PSM1", "Tool");
        let server = Endpoint::new("io", "PSM1-Tool");
        registry.connect(&client, &server).unwrap();
        assert_eq!(
            registry.connections(),
            vec![Connection {
                client: client.clone(),
                server: server.clone()
            }]
        );
        assert_eq!(
            registry.connect(&client, &server),
            Err(RegistryError::AlreadyBound { client })
        );
    }

    #[test]
    fn test_connect_unknown_endpoints() {
        let registry = registry();
        registry.create_component(&arm_spec("PSM1")).unwrap();
        assert_eq!(
            registry.connect(&Endpoint::new("PSM1", "RobotIO"), &Endpoint::new("io", "PSM1")),
            Err(RegistryError::UnknownComponent("io".to_string()))
        );
        assert_eq!(
            registry.connect(&Endpoint::new("PSM1", "Nope"), &Endpoint::new("PSM1", "Robot")),
            Err(RegistryError::UnknownInterface(Endpoint::new("PSM1", "Nope")))
        );
        assert!(registry.connections().is_empty());
        assert!(registry.provides(&Endpoint::new("PSM1", "Robot")));
        assert!(!registry.provides(&Endpoint::new("PSM1", "RobotIO")));
        assert!(!registry.provides(&Endpoint::new("io", "PSM1")));
    }

    #[test]
    fn test_bind_is_all_or_nothing() {
        let registry = registry();
        registry.create_component(&arm_spec("PSM1")).unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut required = RequiredInterface::new("PSM1");
        let known = required.add_function("SetRobotControlState");
        required.add_function("SetPosition");
        required.add_event_handler(MessageKind::Status, tx);

        let server = Endpoint::new("PSM1", "Robot");
        assert!(matches!(
            registry.bind("console", &required, &server),
            Err(RegistryError::MissingCommand { command, .. }) if command == "SetPosition"
        ));
        assert!(!known.is_bound());
        assert!(required.connected_to().is_none());
        assert!(registry.connections().is_empty());
    }

    #[tokio::test]
    async fn test_bound_function_reaches_running_component() {
        let registry = registry();
        registry.create_component(&arm_spec("PSM1")).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut required = RequiredInterface::new("PSM1");
        let set_state = required.add_function("SetRobotControlState");
        for kind in MessageKind::ALL {
            required.add_event_handler(kind, tx.clone());
        }
        registry
            .bind("console", &required, &Endpoint::new("PSM1", "Robot"))
            .unwrap();
        assert_eq!(registry.start(), 1);

        assert_eq!(set_state.call("READY").await, Ok(()));
        assert_eq!(
            rx.recv().await,
            Some(MessageEvent::status("PSM1: control state READY"))
        );

        assert!(matches!(
            set_state.call("").await,
            Err(ExecutionError::Rejected(_))
        ));
        assert_eq!(rx.recv().await.map(|e| e.kind), Some(MessageKind::Error));

        registry.shutdown().await;
        assert!(matches!(
            set_state.call("READY").await,
            Err(ExecutionError::Disconnected(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_runs_cleanup() {
        let registry = registry();
        let cleaned = Arc::new(Mutex::new(false));
        registry
            .add_component(Box::new(CleanupTracker {
                cleaned: cleaned.clone(),
            }))
            .unwrap();
        registry.start();
        assert_eq!(registry.start(), 0);
        registry.shutdown().await;
        tokio::time::timeout(Duration::from_secs(1), async {
            while !*cleaned.lock().unwrap() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("cleanup ran");
    }
}
