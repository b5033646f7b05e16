// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;

use rkit_core::{Component, ComponentKind, ComponentSpec, DynResult};

mod arm;
mod control_loop;
mod io;
mod local;
mod task;

pub use arm::SimArm;
pub use control_loop::SimControlLoop;
pub use io::SimIo;
pub use local::LocalRegistry;

/// Builds an unconfigured component from its spec.
pub type ComponentFactory = fn(&ComponentSpec) -> DynResult<Box<dyn Component>>;

/// Construction table keyed by component kind.
#[derive(Clone, Default)]
pub struct RegistrationContext {
    factories: HashMap<ComponentKind, ComponentFactory>,
}

impl RegistrationContext {
    /// Create a new empty registration context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for a kind.
    pub fn register_factory(&mut self, kind: ComponentKind, factory: ComponentFactory) {
        self.factories.insert(kind, factory);
    }

    pub fn is_registered(&self, kind: ComponentKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// List registered kinds in a stable order.
    pub fn registered_kinds(&self) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = self.factories.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Instantiate the component described by `spec`.
    pub fn build(&self, spec: &ComponentSpec) -> DynResult<Box<dyn Component>> {
        let factory = self
            .factories
            .get(&spec.kind)
            .ok_or_else(|| format!("Unknown component kind: {}", spec.kind))?;
        factory(spec)
    }

    /// Merge another registration context into this one.
    pub fn extend_from(&mut self, other: &RegistrationContext) {
        for (kind, factory) in &other.factories {
            self.factories.insert(*kind, *factory);
        }
    }
}

/// Register the simulated control loop and research-kit arms on a context.
pub fn register_builtin_components_on(context: &mut RegistrationContext) {
    context.register_factory(ComponentKind::ControlLoop, control_loop_factory);
    context.register_factory(ComponentKind::MasterManipulator, arm_factory);
    context.register_factory(ComponentKind::PatientSideManipulator, arm_factory);
    context.register_factory(ComponentKind::EndoscopeManipulator, arm_factory);
}

fn control_loop_factory(spec: &ComponentSpec) -> DynResult<Box<dyn Component>> {
    Ok(Box::new(SimControlLoop::new(&spec.name, spec.period)))
}

fn arm_factory(spec: &ComponentSpec) -> DynResult<Box<dyn Component>> {
    let arm_type = spec
        .kind
        .arm_type()
        .ok_or_else(|| format!("{} is not an arm kind", spec.kind))?;
    Ok(Box::new(SimArm::new(&spec.name, arm_type, spec.period)))
}
