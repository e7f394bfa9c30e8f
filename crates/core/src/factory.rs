// SPDX-License-Identifier: MIT

//! Process-wide component factory registry.
//!
//! Mirrors `iot_component_factory_add`/`iot_component_factory_find`:
//! registration is additive and by type name only. A second registration
//! under an already-used type name is silently ignored — the first
//! registration wins.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::component::ComponentCore;
use crate::config::ConfigMap;
use crate::error::FactoryError;

/// Anything with a lifecycle, erased behind a trait object so the factory
/// registry and the container can hold components of many concrete types.
pub trait Component: Send + Sync + Any {
    fn core(&self) -> &ComponentCore;
    fn as_any(&self) -> &dyn Any;

    /// Upcast an owning handle to `Arc<dyn Any + Send + Sync>`, so a caller
    /// holding only `Arc<dyn Component>` can recover `Arc<ConcreteType>` via
    /// `Arc<dyn Any + Send + Sync>::downcast`. Every implementor's body is
    /// just `self`; the coercion is what does the work.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Move this component to `Running`, the way its concrete `start()`
    /// would. The container calls this in insertion order.
    fn start(&self);

    /// Move this component to `Stopped`. The container calls this in
    /// reverse insertion order.
    fn stop(&self);
}

/// Resolves a named component, used by factories whose configuration
/// references other instances (e.g. a pool's logger, a scheduler's pool).
/// Implemented by `svcrt_container::Container`; kept as a trait here so
/// `svcrt-core` does not depend on `svcrt-container`.
pub trait ComponentLookup {
    fn find(&self, name: &str) -> Option<Arc<dyn Component>>;
}

pub trait ComponentFactory: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn category(&self) -> &'static str;

    fn config(
        &self,
        map: &ConfigMap,
        lookup: &dyn ComponentLookup,
    ) -> Result<Arc<dyn Component>, FactoryError>;

    /// Attempt to apply `map` to an already-built component. Returns `false`
    /// if the concrete type does not support reconfiguration (the default).
    fn reconfigure(&self, _component: &dyn Component, _map: &ConfigMap) -> bool {
        false
    }
}

type Registry = Mutex<HashMap<&'static str, Arc<dyn ComponentFactory>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a factory. Returns `true` if this registration took effect,
/// `false` if a factory for this type name was already registered.
pub fn register_factory(factory: Arc<dyn ComponentFactory>) -> bool {
    let mut guard = registry().lock();
    if guard.contains_key(factory.type_name()) {
        tracing::debug!(type_name = factory.type_name(), "factory already registered, ignoring");
        return false;
    }
    guard.insert(factory.type_name(), factory);
    true
}

pub fn find_factory(type_name: &str) -> Option<Arc<dyn ComponentFactory>> {
    registry().lock().get(type_name).cloned()
}

#[cfg(any(test, feature = "test-support"))]
pub fn clear_registry_for_test() {
    registry().lock().clear();
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
