// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use svcrt_core::{
    clear_registry_for_test, register_factory, Component, ComponentCore, ComponentFactory,
    ComponentLookup, ComponentState, ConfigMap, FactoryError, MapConfigLoader,
};

use super::*;

/// A component whose `start`/`stop` append their name to a shared log, so
/// ordering tests can assert on call sequence rather than just end state.
struct OrderedStub {
    core: ComponentCore,
    log: Arc<StdMutex<Vec<String>>>,
}

impl OrderedStub {
    fn new(name: &str, log: Arc<StdMutex<Vec<String>>>) -> Self {
        let core = ComponentCore::new(name);
        let log_starting = log.clone();
        let name_starting = name.to_string();
        core.set_starting_callback(move || log_starting.lock().unwrap().push(format!("{name_starting}:starting")));
        let log_stopping = log.clone();
        let name_stopping = name.to_string();
        core.set_stopping_callback(move || log_stopping.lock().unwrap().push(format!("{name_stopping}:stopping")));
        let log_running = log.clone();
        let name_running = name.to_string();
        core.set_running_callback(move |_| log_running.lock().unwrap().push(format!("{name_running}:running")));
        Self { core, log }
    }
}

impl Component for OrderedStub {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
        self
    }

    fn start(&self) {
        self.log.lock().unwrap().push(format!("{}:start", self.core.name()));
        self.core.set_state(ComponentState::Running);
    }

    fn stop(&self) {
        self.log.lock().unwrap().push(format!("{}:stop", self.core.name()));
        self.core.set_state(ComponentState::Stopped);
    }
}

struct StubFactory(&'static str, AtomicUsize);

impl ComponentFactory for StubFactory {
    fn type_name(&self) -> &'static str {
        self.0
    }

    fn category(&self) -> &'static str {
        "Test"
    }

    fn config(
        &self,
        map: &ConfigMap,
        _lookup: &dyn ComponentLookup,
    ) -> Result<Arc<dyn Component>, FactoryError> {
        self.1.fetch_add(1, Ordering::Relaxed);
        let name = map.get("Name").unwrap_or("stub").to_string();
        Ok(Arc::new(OrderedStub::new(&name, Arc::new(StdMutex::new(Vec::new())))))
    }
}

#[test]
fn find_and_list_reflect_registered_components() {
    let container = Container::alloc("test-container");
    let log = Arc::new(StdMutex::new(Vec::new()));
    container.register("Test::Stub", "a", Arc::new(OrderedStub::new("a", log.clone())));
    container.register("Test::Stub", "b", Arc::new(OrderedStub::new("b", log.clone())));

    assert!(container.find("a").is_some());
    assert!(container.find("missing").is_none());

    let names: Vec<_> = container.list().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn start_runs_hooks_in_insertion_order_stop_in_reverse() {
    let container = Container::alloc("test-container");
    let log = Arc::new(StdMutex::new(Vec::new()));
    container.register("Test::Stub", "first", Arc::new(OrderedStub::new("first", log.clone())));
    container.register("Test::Stub", "second", Arc::new(OrderedStub::new("second", log.clone())));

    container.start();
    container.stop();

    let recorded = log.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            "first:starting",
            "first:start",
            "first:running",
            "second:starting",
            "second:start",
            "second:running",
            "second:stopping",
            "second:stop",
            "first:stopping",
            "first:stop",
        ]
    );
}

#[test]
fn remove_component_drops_it_from_the_map() {
    let container = Container::alloc("test-container");
    let log = Arc::new(StdMutex::new(Vec::new()));
    container.register("Test::Stub", "a", Arc::new(OrderedStub::new("a", log)));
    assert!(container.remove_component("a"));
    assert!(container.find("a").is_none());
    assert!(!container.remove_component("a"));
}

#[test]
fn free_marks_every_component_deleted() {
    let container = Container::alloc("test-container");
    let log = Arc::new(StdMutex::new(Vec::new()));
    let stub = Arc::new(OrderedStub::new("a", log));
    container.register("Test::Stub", "a", stub.clone());

    container.free();

    assert_eq!(stub.core().state(), ComponentState::Deleted);
}

#[test]
fn free_decrements_the_reference_count_exactly_once() {
    let container = Container::alloc("test-container");
    let log = Arc::new(StdMutex::new(Vec::new()));
    let stub = Arc::new(OrderedStub::new("a", log));
    // A second observer holds its own reference, as `find` callers do.
    stub.core().add_ref();
    container.register("Test::Stub", "a", stub.clone());

    container.free();

    // `free`'s own `dec_ref` shouldn't be the last one while our extra
    // reference is outstanding; ours is.
    assert!(stub.core().dec_ref());
}

#[test]
fn init_builds_components_from_loader_master_map() {
    clear_registry_for_test();
    register_factory(Arc::new(StubFactory("Test::InitStub", AtomicUsize::new(0))));

    let loader = Arc::new(
        MapConfigLoader::new()
            .with("test-container", "log=Test::InitStub\n")
            .with("log", "Name=log\n"),
    );
    let container = Container::alloc("test-container");
    container.set_config(loader, "unused-uri", None);
    container.init().unwrap();

    let names: Vec<_> = container.list().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["log".to_string()]);
}

#[test]
fn init_skips_entries_whose_factory_is_missing() {
    clear_registry_for_test();
    let loader = Arc::new(MapConfigLoader::new().with("test-container", "ghost=Test::NoSuchType\n"));
    let container = Container::alloc("test-container");
    container.set_config(loader, "unused-uri", None);

    container.init().unwrap();

    assert!(container.list().is_empty());
}

#[test]
fn init_without_loader_errors() {
    let container = Container::alloc("test-container");
    assert!(container.init().is_err());
}
