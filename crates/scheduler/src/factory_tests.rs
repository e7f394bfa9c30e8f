// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;
use svcrt_core::ConfigMap;

struct MapLookup(HashMap<String, Arc<dyn Component>>);

impl ComponentLookup for MapLookup {
    fn find(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.0.get(name).cloned()
    }
}

#[test]
fn missing_pool_key_is_rejected() {
    let lookup = MapLookup(HashMap::new());
    assert!(SchedulerFactory.config(&ConfigMap::new(), &lookup).is_err());
}

#[test]
fn unresolvable_pool_name_is_not_found() {
    let mut map = ConfigMap::new();
    map.insert("ThreadPool", "missing");
    let lookup = MapLookup(HashMap::new());
    assert!(matches!(
        SchedulerFactory.config(&map, &lookup),
        Err(svcrt_core::FactoryError::NotFound(_))
    ));
}

#[test]
fn builds_scheduler_from_registered_pool() {
    let pool = ThreadPool::alloc(1, 0, None);
    let mut entries: HashMap<String, Arc<dyn Component>> = HashMap::new();
    entries.insert("main-pool".to_string(), pool);
    let lookup = MapLookup(entries);

    let mut map = ConfigMap::new();
    map.insert("ThreadPool", "main-pool").insert("Priority", "-1");
    let built = SchedulerFactory.config(&map, &lookup).unwrap();
    assert_eq!(built.core().name(), "Scheduler");
}

#[test]
fn unresolvable_logger_name_is_not_found() {
    let pool = ThreadPool::alloc(1, 0, None);
    let mut entries: HashMap<String, Arc<dyn Component>> = HashMap::new();
    entries.insert("main-pool".to_string(), pool);
    let lookup = MapLookup(entries);

    let mut map = ConfigMap::new();
    map.insert("ThreadPool", "main-pool").insert("Logger", "missing");
    assert!(matches!(
        SchedulerFactory.config(&map, &lookup),
        Err(svcrt_core::FactoryError::NotFound(_))
    ));
}
