// SPDX-License-Identifier: MIT

//! Named component map, grounded on `iot_container_t`: an insertion-ordered
//! instance table plus the process-wide factory registry, driving every
//! component through the same `starting -> start -> running` /
//! `stopping -> stop` hook sequence in (reverse-)insertion order.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use svcrt_core::{
    find_factory, Component, ComponentFactory, ComponentLookup, ComponentState, ConfigLoader,
    ConfigMap, ConfigSaver, ContainerError, FactoryError,
};

struct Entry {
    type_name: String,
    component: Arc<dyn Component>,
}

struct Inner {
    loader: Option<Arc<dyn ConfigLoader>>,
    saver: Option<Arc<dyn ConfigSaver>>,
    uri: String,
    entries: IndexMap<String, Entry>,
}

/// A point-in-time row for [`Container::list`].
#[derive(Debug, Clone)]
pub struct ComponentSummary {
    pub name: String,
    pub type_name: String,
    pub state: ComponentState,
}

/// Owns every component built for one configuration namespace, driving their
/// lifecycles in the order they were registered.
pub struct Container {
    name: String,
    inner: Mutex<Inner>,
}

impl Container {
    pub fn alloc(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                loader: None,
                saver: None,
                uri: String::new(),
                entries: IndexMap::new(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_config(
        &self,
        loader: Arc<dyn ConfigLoader>,
        uri: impl Into<String>,
        saver: Option<Arc<dyn ConfigSaver>>,
    ) {
        let mut inner = self.inner.lock();
        inner.loader = Some(loader);
        inner.uri = uri.into();
        inner.saver = saver;
    }

    /// Load the container's master map (instance-name -> type-name) and
    /// build a component for every entry.
    pub fn init(self: &Arc<Self>) -> Result<(), ContainerError> {
        let (loader, uri) = {
            let inner = self.inner.lock();
            (inner.loader.clone(), inner.uri.clone())
        };
        let loader = loader.ok_or(ContainerError::NoLoader)?;
        let master_text = loader
            .load(&self.name, &uri)
            .ok_or_else(|| ContainerError::NotFound(self.name.clone()))?;
        let master = parse_line_map(&master_text);

        for (instance_name, type_name) in master {
            if let Err(err) = self.add_component(&type_name, &instance_name, &loader, &uri) {
                tracing::warn!(
                    instance = %instance_name,
                    type_name = %type_name,
                    error = %err,
                    "skipping component during init"
                );
            }
        }
        Ok(())
    }

    /// Build and register `instance_name` of `type_name`, loading its
    /// config text from `loader` at `uri`. Used by [`Self::init`] and
    /// available directly for hot-add after init.
    pub fn add_component(
        self: &Arc<Self>,
        type_name: &str,
        instance_name: &str,
        loader: &Arc<dyn ConfigLoader>,
        uri: &str,
    ) -> Result<(), ContainerError> {
        let factory = find_factory(type_name).ok_or_else(|| FactoryError::NotFound(type_name.to_string()))?;
        let config_text = loader.load(instance_name, uri).unwrap_or_default();
        let map = ConfigMap::from_map(parse_line_map(&config_text).into_iter().collect());
        let component = factory.config(&map, self.as_ref())?;
        self.register(type_name, instance_name, component);
        Ok(())
    }

    /// Insert an already-built component directly, bypassing the loader —
    /// the path `add_component` above uses internally, also exposed for
    /// tests and embedders that construct components themselves.
    pub fn register(&self, type_name: &str, instance_name: &str, component: Arc<dyn Component>) {
        let mut inner = self.inner.lock();
        inner.entries.insert(
            instance_name.to_string(),
            Entry {
                type_name: type_name.to_string(),
                component,
            },
        );
    }

    pub fn remove_component(&self, name: &str) -> bool {
        self.inner.lock().entries.shift_remove(name).is_some()
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.inner.lock().entries.get(name).map(|e| e.component.clone())
    }

    pub fn list(&self) -> Vec<ComponentSummary> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(name, entry)| ComponentSummary {
                name: name.clone(),
                type_name: entry.type_name.clone(),
                state: entry.component.core().state(),
            })
            .collect()
    }

    /// `starting` hook, then `start()`, then `running` hook, in insertion
    /// order for every registered component.
    pub fn start(&self) {
        let components: Vec<_> = self.inner.lock().entries.values().map(|e| e.component.clone()).collect();
        for component in &components {
            component.core().call_starting_hook();
            component.start();
            component.core().call_running_hook(false);
        }
    }

    /// `stopping` hook, then `stop()`, in reverse insertion order.
    pub fn stop(&self) {
        let components: Vec<_> = self.inner.lock().entries.values().map(|e| e.component.clone()).collect();
        for component in components.iter().rev() {
            component.core().call_stopping_hook();
            component.stop();
        }
    }

    /// Stop if not already stopped, mark every component `Deleted`,
    /// decrement its reference count, and drop the container's own strong
    /// reference to each.
    pub fn free(&self) {
        let entries = {
            let mut inner = self.inner.lock();
            std::mem::take(&mut inner.entries)
        };
        for entry in entries.values() {
            if entry.component.core().state() != ComponentState::Stopped {
                entry.component.core().set_state(ComponentState::Stopped);
            }
            entry.component.core().set_state(ComponentState::Deleted);
            if entry.component.core().dec_ref() {
                tracing::debug!(name = entry.component.core().name(), "last reference freed");
            }
        }
    }

    /// Persist `text` for `name` through the installed saver, if any.
    /// A no-op when the container was configured without one.
    pub fn save(&self, name: &str, text: &str) {
        let inner = self.inner.lock();
        if let Some(saver) = &inner.saver {
            saver.save(name, &inner.uri, text);
        }
    }

    /// Delegate to the factory's `reconfigure`, if the type supports it.
    pub fn reconfigure(&self, name: &str, map: &ConfigMap) -> bool {
        let (type_name, component) = {
            let inner = self.inner.lock();
            match inner.entries.get(name) {
                Some(entry) => (entry.type_name.clone(), entry.component.clone()),
                None => return false,
            }
        };
        match find_factory(&type_name) {
            Some(factory) => factory.reconfigure(component.as_ref(), map),
            None => false,
        }
    }
}

impl ComponentLookup for Container {
    fn find(&self, name: &str) -> Option<Arc<dyn Component>> {
        Container::find(self, name)
    }
}

/// The container's own minimal configuration text format: one `key=value`
/// pair per line, blank lines and `#`-prefixed comments ignored. Real-world
/// embedders are expected to supply a loader that parses JSON/TOML/etc and
/// hand the container plain `key=value` text instead; this keeps the
/// container decoupled from any particular serialization without inventing
/// a trait for a format nothing else in this workspace needs.
fn parse_line_map(text: &str) -> indexmap::IndexMap<String, String> {
    let mut map = indexmap::IndexMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
