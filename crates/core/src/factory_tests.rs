// SPDX-License-Identifier: MIT

use super::*;
use crate::component::ComponentCore;
use std::any::Any;

struct StubComponent(ComponentCore);

impl Component for StubComponent {
    fn core(&self) -> &ComponentCore {
        &self.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn start(&self) {
        self.0.set_state(crate::state::ComponentState::Running);
    }

    fn stop(&self) {
        self.0.set_state(crate::state::ComponentState::Stopped);
    }
}

struct StubFactory(&'static str);

impl ComponentFactory for StubFactory {
    fn type_name(&self) -> &'static str {
        self.0
    }

    fn category(&self) -> &'static str {
        "Test"
    }

    fn config(
        &self,
        _map: &ConfigMap,
        _lookup: &dyn ComponentLookup,
    ) -> Result<Arc<dyn Component>, FactoryError> {
        Ok(Arc::new(StubComponent(ComponentCore::new("stub"))))
    }
}

struct NoLookup;
impl ComponentLookup for NoLookup {
    fn find(&self, _name: &str) -> Option<Arc<dyn Component>> {
        None
    }
}

#[test]
fn first_registration_wins() {
    clear_registry_for_test();
    assert!(register_factory(Arc::new(StubFactory("Test::Stub"))));
    assert!(!register_factory(Arc::new(StubFactory("Test::Stub"))));
    assert!(find_factory("Test::Stub").is_some());
}

#[test]
fn unregistered_type_is_not_found() {
    clear_registry_for_test();
    assert!(find_factory("Test::Nope").is_none());
}

#[test]
fn factory_builds_a_component() {
    clear_registry_for_test();
    register_factory(Arc::new(StubFactory("Test::Builder")));
    let factory = find_factory("Test::Builder").unwrap();
    let built = factory.config(&ConfigMap::new(), &NoLookup).unwrap();
    assert_eq!(built.core().name(), "stub");
}
