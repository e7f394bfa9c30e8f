// SPDX-License-Identifier: MIT

//! A unit of work submitted to the pool.

/// Boxed closure plus optional priority override, the Rust analogue of the
/// original's `(function, arg, priority, prio_set)` tuple. The free-list
/// cache the original keeps for job nodes has no counterpart here: a boxed
/// closure is already a single allocation, and `VecDeque` reuses its backing
/// storage as jobs are popped and pushed.
pub struct Job {
    pub(crate) run: Box<dyn FnOnce() + Send + 'static>,
    pub(crate) priority: Option<i32>,
}

impl Job {
    pub fn new(run: impl FnOnce() + Send + 'static) -> Self {
        Self { run, priority: None }
    }

    pub fn with_priority(run: impl FnOnce() + Send + 'static, priority: i32) -> Self {
        Self {
            run,
            priority: Some(priority),
        }
    }

    pub fn with_priority_opt(run: impl FnOnce() + Send + 'static, priority: Option<i32>) -> Self {
        Self { run, priority }
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }
}
