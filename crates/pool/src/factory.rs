// SPDX-License-Identifier: MIT

//! Container-facing factory for [`ThreadPool`], grounded on
//! `iot_threadpool_config`/`iot_threadpool_factory` in the original
//! threadpool source: `Threads`, `MaxJobs`, and `Priority` config keys.

use std::sync::Arc;

use svcrt_core::{Component, ComponentFactory, ComponentLookup, ConfigMap, FactoryError, Logger};

use crate::pool::ThreadPool;

pub const THREAD_POOL_TYPE: &str = "Svcrt::ThreadPool";

const DEFAULT_THREADS: u32 = 2;
const DEFAULT_MAX_JOBS: u32 = 0;

pub struct ThreadPoolFactory;

impl ComponentFactory for ThreadPoolFactory {
    fn type_name(&self) -> &'static str {
        THREAD_POOL_TYPE
    }

    fn category(&self) -> &'static str {
        "Svcrt::Core"
    }

    fn config(
        &self,
        map: &ConfigMap,
        lookup: &dyn ComponentLookup,
    ) -> Result<Arc<dyn Component>, FactoryError> {
        let threads = map
            .get_u64("Threads")
            .map_err(|_| FactoryError::ConfigRejected(THREAD_POOL_TYPE.to_string()))?
            .unwrap_or(DEFAULT_THREADS as u64) as u32;
        let max_jobs = map
            .get_u64("MaxJobs")
            .map_err(|_| FactoryError::ConfigRejected(THREAD_POOL_TYPE.to_string()))?
            .unwrap_or(DEFAULT_MAX_JOBS as u64) as u32;
        let priority = map
            .get_i64("Priority")
            .map_err(|_| FactoryError::ConfigRejected(THREAD_POOL_TYPE.to_string()))?
            .map(|p| p as i32);

        let pool = ThreadPool::alloc(threads, max_jobs, priority);

        if let Some(logger_name) = map.get("Logger") {
            let logger_component = lookup
                .find(logger_name)
                .ok_or_else(|| FactoryError::NotFound(logger_name.to_string()))?;
            let logger = logger_component
                .as_any_arc()
                .downcast::<Logger>()
                .map_err(|_| FactoryError::ConfigRejected(THREAD_POOL_TYPE.to_string()))?;
            pool.set_logger(logger);
        }

        Ok(pool)
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
