// SPDX-License-Identifier: MIT

//! Container-facing factory for [`Scheduler`], reading `ThreadPool`,
//! `Priority`, `Affinity`, and `Logger` config keys (the recognized
//! configuration options for the original `iot_scheduler_factory`), where
//! `ThreadPool` and `Logger` are instance-names of already-registered
//! components.

use std::sync::Arc;

use svcrt_core::{Component, ComponentFactory, ComponentLookup, ConfigMap, FactoryError, Logger};
use svcrt_pool::ThreadPool;

use crate::scheduler::Scheduler;

pub const SCHEDULER_TYPE: &str = "Svcrt::Scheduler";

pub struct SchedulerFactory;

impl ComponentFactory for SchedulerFactory {
    fn type_name(&self) -> &'static str {
        SCHEDULER_TYPE
    }

    fn category(&self) -> &'static str {
        "Svcrt::Core"
    }

    fn config(
        &self,
        map: &ConfigMap,
        lookup: &dyn ComponentLookup,
    ) -> Result<Arc<dyn Component>, FactoryError> {
        let pool_name = map.require_str("ThreadPool").map_err(|_| {
            FactoryError::ConfigRejected(SCHEDULER_TYPE.to_string())
        })?;
        let pool_component = lookup
            .find(pool_name)
            .ok_or_else(|| FactoryError::NotFound(pool_name.to_string()))?;
        let pool_arc = pool_component
            .as_any_arc()
            .downcast::<ThreadPool>()
            .map_err(|_| FactoryError::ConfigRejected(SCHEDULER_TYPE.to_string()))?;

        let priority = map.get_i64("Priority").ok().flatten().map(|p| p as i32);
        let affinity = map.get_i64("Affinity").ok().flatten().map(|a| a as i32);

        let logger = match map.get("Logger") {
            Some(logger_name) => {
                let logger_component = lookup
                    .find(logger_name)
                    .ok_or_else(|| FactoryError::NotFound(logger_name.to_string()))?;
                let logger = logger_component
                    .as_any_arc()
                    .downcast::<Logger>()
                    .map_err(|_| FactoryError::ConfigRejected(SCHEDULER_TYPE.to_string()))?;
                Some(logger)
            }
            None => None,
        };

        Ok(Scheduler::alloc(priority, affinity, logger, pool_arc))
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
