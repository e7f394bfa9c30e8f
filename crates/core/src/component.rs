// SPDX-License-Identifier: MIT

//! The lifecycle primitive every component type (logger, pool, scheduler)
//! embeds: name, state, reference count, and the three container-ordering
//! hooks (starting/stopping/running).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::config::ConfigMap;
use crate::state::{ComponentState, StateMask};

type StartingHook = Box<dyn Fn() + Send + Sync>;
type StoppingHook = Box<dyn Fn() + Send + Sync>;
type RunningHook = Box<dyn Fn(bool) + Send + Sync>;

struct Inner {
    state: ComponentState,
    config: ConfigMap,
}

struct Hooks {
    starting: Option<StartingHook>,
    stopping: Option<StoppingHook>,
    running: Option<RunningHook>,
}

/// Shared lifecycle state embedded in every concrete component.
///
/// A single mutex guards the state (and, for `ThreadPool`/`Scheduler`, the
/// owner's own hot-path data lives behind the *same* lock rather than a
/// second one — see those crates). `ComponentCore` only ever locks its own
/// narrow `Inner`.
pub struct ComponentCore {
    name: String,
    inner: Mutex<Inner>,
    cond: Condvar,
    refs: AtomicI64,
    hooks: Mutex<Hooks>,
}

/// RAII guard returned by [`ComponentCore::lock`] / [`ComponentCore::wait_and_lock`].
/// Dropping it releases the lock — the Rust analogue of the original's
/// "caller must call unlock" contract, enforced by the type system instead
/// of by convention.
pub struct ComponentGuard<'a> {
    core: &'a ComponentCore,
    guard: MutexGuard<'a, Inner>,
}

impl ComponentGuard<'_> {
    pub fn state(&self) -> ComponentState {
        self.guard.state
    }

    pub fn config(&self) -> &ConfigMap {
        &self.guard.config
    }

    pub fn set_config(&mut self, config: ConfigMap) {
        self.guard.config = config;
    }

    /// Set the state while already holding the lock. Returns `false` (and
    /// leaves the state untouched) if the transition is illegal.
    pub fn set_state(&mut self, next: ComponentState) -> bool {
        if !self.guard.state.can_transition_to(next) {
            return false;
        }
        self.guard.state = next;
        self.core.cond.notify_all();
        true
    }
}

impl ComponentCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                state: ComponentState::Initial,
                config: ConfigMap::new(),
            }),
            cond: Condvar::new(),
            refs: AtomicI64::new(1),
            hooks: Mutex::new(Hooks {
                starting: None,
                stopping: None,
                running: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ComponentState {
        self.inner.lock().state
    }

    /// Acquire the component lock, returning a guard that releases it on drop.
    pub fn lock(&self) -> ComponentGuard<'_> {
        ComponentGuard {
            core: self,
            guard: self.inner.lock(),
        }
    }

    /// Attempt `state -> next`. Returns `true` if the transition occurred.
    pub fn set_state(&self, next: ComponentState) -> bool {
        self.lock().set_state(next)
    }

    /// Block until the component is in one of `states`, without holding the
    /// lock afterwards.
    pub fn wait(&self, states: StateMask) -> ComponentState {
        let mut guard = self.inner.lock();
        while !states.matches(guard.state) {
            self.cond.wait(&mut guard);
        }
        guard.state
    }

    /// Block until the component is in one of `states`, returning a guard
    /// that holds the lock for the caller to continue under.
    pub fn wait_and_lock(&self, states: StateMask) -> ComponentGuard<'_> {
        let mut guard = self.inner.lock();
        while !states.matches(guard.state) {
            self.cond.wait(&mut guard);
        }
        ComponentGuard { core: self, guard }
    }

    pub fn add_ref(&self) {
        self.refs.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the reference count. Returns `true` the one time the count
    /// drops to (or at) zero, so the caller knows it owns the last reference
    /// and must finalize the component.
    pub fn dec_ref(&self) -> bool {
        self.refs.fetch_sub(1, Ordering::SeqCst) <= 1
    }

    pub fn set_starting_callback(&self, f: impl Fn() + Send + Sync + 'static) {
        self.hooks.lock().starting = Some(Box::new(f));
    }

    pub fn set_stopping_callback(&self, f: impl Fn() + Send + Sync + 'static) {
        self.hooks.lock().stopping = Some(Box::new(f));
    }

    pub fn set_running_callback(&self, f: impl Fn(bool) + Send + Sync + 'static) {
        self.hooks.lock().running = Some(Box::new(f));
    }

    pub fn call_starting_hook(&self) {
        if let Some(f) = self.hooks.lock().starting.as_ref() {
            f();
        }
    }

    pub fn call_stopping_hook(&self) {
        if let Some(f) = self.hooks.lock().stopping.as_ref() {
            f();
        }
    }

    pub fn call_running_hook(&self, timeout: bool) {
        if let Some(f) = self.hooks.lock().running.as_ref() {
            f(timeout);
        }
    }

    /// A point-in-time snapshot suitable for external reporting.
    pub fn read(&self) -> ComponentSnapshot {
        let guard = self.inner.lock();
        ComponentSnapshot {
            name: self.name.clone(),
            state: guard.state,
            config: guard.config.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComponentSnapshot {
    pub name: String,
    pub state: ComponentState,
    pub config: ConfigMap,
}

/// Shared handle to a component, as the container stores it.
pub type ComponentRef = Arc<dyn crate::factory::Component>;

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
