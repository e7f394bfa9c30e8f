// SPDX-License-Identifier: MIT

//! Priority-ordered worker pool.
//!
//! Grounded directly on `iot_threadpool_t`/`iot_threadpool_thread` in the
//! original threadpool source: one mutex guards both the lifecycle state and
//! the job queue, with three condition variables alongside it (`job_cond`
//! for "new job available", `queue_cond` for "space freed in the queue",
//! `work_cond` for "queue and working-count both reached zero"). `state_cond`
//! collapses into the pool's own condvar, broadcast on every state change,
//! since Rust's `Condvar` has no notion of per-predicate wakeup the way the
//! original's four pthread condvars do.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use svcrt_core::{ComponentCore, ComponentState, Logger};

use crate::job::Job;

struct QueuedJob {
    job: Job,
    priority: Option<i32>,
}

struct Inner {
    state: ComponentState,
    queue: VecDeque<QueuedJob>,
    max_jobs: u32,
    working: u32,
}

/// A bounded, priority-aware pool of long-lived worker threads.
pub struct ThreadPool {
    core: ComponentCore,
    inner: Mutex<Inner>,
    job_cond: Condvar,
    queue_cond: Condvar,
    work_cond: Condvar,
    threads: Mutex<Vec<JoinHandle<()>>>,
    default_priority: Option<i32>,
    dispatched: AtomicUsize,
    logger: Mutex<Option<Arc<Logger>>>,
}

/// `MaxJobs = 0` means unbounded, matching the original's `UINT32_MAX`
/// sentinel for an unset `MaxJobs` config key.
const UNBOUNDED: u32 = u32::MAX;

impl ThreadPool {
    pub fn alloc(threads: u32, max_jobs: u32, default_priority: Option<i32>) -> Arc<Self> {
        let pool = Arc::new(Self {
            core: ComponentCore::new("ThreadPool"),
            inner: Mutex::new(Inner {
                state: ComponentState::Initial,
                queue: VecDeque::new(),
                max_jobs: if max_jobs == 0 { UNBOUNDED } else { max_jobs },
                working: 0,
            }),
            job_cond: Condvar::new(),
            queue_cond: Condvar::new(),
            work_cond: Condvar::new(),
            threads: Mutex::new(Vec::new()),
            default_priority,
            dispatched: AtomicUsize::new(0),
            logger: Mutex::new(None),
        });

        let mut handles = Vec::with_capacity(threads as usize);
        for id in 0..threads {
            let worker_pool = pool.clone();
            handles.push(
                std::thread::Builder::new()
                    .name(format!("thread-pool-{id}"))
                    .spawn(move || worker_pool.worker_loop(id))
                    .expect("spawning a pool worker thread"),
            );
        }
        *pool.threads.lock() = handles;
        pool
    }

    pub fn core(&self) -> &ComponentCore {
        &self.core
    }

    /// Attach a logger for diagnostics (queue-full rejections). Wired up by
    /// [`crate::factory::ThreadPoolFactory`] when a `Logger` config key
    /// resolves; not set at all means diagnostics are simply skipped.
    pub fn set_logger(&self, logger: Arc<Logger>) {
        *self.logger.lock() = Some(logger);
    }

    /// Number of jobs this pool has handed to a worker since creation.
    /// Exposed for tests and diagnostics, not part of the original API.
    pub fn dispatched_count(&self) -> usize {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if inner.state != ComponentState::Running {
            inner.state = ComponentState::Running;
            self.core.set_state(ComponentState::Running);
            self.job_cond.notify_all();
        }
    }

    /// Cooperative stop: in-flight jobs finish, queued jobs are retained so
    /// a subsequent `start()` resumes dispatching them.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.state != ComponentState::Stopped {
            inner.state = ComponentState::Stopped;
            self.core.set_state(ComponentState::Stopped);
            self.job_cond.notify_all();
        }
    }

    /// Block until the queue is empty and no worker is mid-job.
    pub fn wait(&self) {
        let mut inner = self.inner.lock();
        while !inner.queue.is_empty() || inner.working > 0 {
            self.work_cond.wait(&mut inner);
        }
    }

    /// Enqueue `job`, blocking the caller until the queue has space if it is
    /// currently full.
    pub fn add_work(&self, job: Job) {
        let mut inner = self.inner.lock();
        while inner.queue.len() as u32 >= inner.max_jobs {
            self.queue_cond.wait(&mut inner);
        }
        Self::enqueue_locked(&mut inner, job);
        self.job_cond.notify_one();
    }

    /// Enqueue `job` only if the queue is not full. Never blocks; this is
    /// the dispatcher-safe variant the scheduler relies on.
    pub fn try_work(&self, job: Job) -> bool {
        let mut inner = self.inner.lock();
        if inner.queue.len() as u32 >= inner.max_jobs {
            if let Some(logger) = self.logger.lock().as_ref() {
                logger.debug("try_work rejected: queue at MaxJobs");
            }
            return false;
        }
        Self::enqueue_locked(&mut inner, job);
        self.job_cond.notify_one();
        true
    }

    /// Queue-ordering invariant: a job with a priority is inserted ahead of
    /// the first queued job that either has no priority or a strictly lower
    /// priority. Jobs without a priority always append to the tail, so they
    /// never reorder relative to each other or preempt anything.
    fn enqueue_locked(inner: &mut Inner, job: Job) {
        let priority = job.priority();
        let queued = QueuedJob { job, priority };

        if let Some(p) = priority {
            let pos = inner
                .queue
                .iter()
                .position(|q| q.priority.is_none() || q.priority.unwrap() < p);
            if let Some(pos) = pos {
                inner.queue.insert(pos, queued);
                return;
            }
        }
        inner.queue.push_back(queued);
    }

    /// `true` once free() has torn down the pool's worker threads.
    pub fn free(self: &Arc<Self>) {
        self.wait();
        {
            let mut inner = self.inner.lock();
            if inner.state != ComponentState::Stopped {
                inner.state = ComponentState::Stopped;
                self.core.set_state(ComponentState::Stopped);
            }
            inner.state = ComponentState::Deleted;
            self.core.set_state(ComponentState::Deleted);
            self.job_cond.notify_all();
        }
        let handles = std::mem::take(&mut *self.threads.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }

    fn worker_loop(self: Arc<Self>, id: u32) {
        let mut current_priority: Option<i32> = None;
        loop {
            let mut inner = self.inner.lock();
            while inner.state != ComponentState::Running && inner.state != ComponentState::Deleted
            {
                self.job_cond.wait(&mut inner);
            }
            if inner.state == ComponentState::Deleted {
                return;
            }

            let Some(popped) = inner.queue.pop_front() else {
                self.job_cond.wait(&mut inner);
                continue;
            };

            let was_full = inner.queue.len() as u32 + 1 == inner.max_jobs;
            if inner.queue.is_empty() {
                self.work_cond.notify_one();
            }
            if was_full {
                self.queue_cond.notify_all();
            }
            inner.working += 1;
            drop(inner);

            if let Some(p) = popped.priority {
                if current_priority != Some(p) {
                    if try_set_thread_priority(p) {
                        current_priority = Some(p);
                    }
                }
            }

            self.dispatched.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(worker = id, "running job");
            (popped.job.run)();

            let mut inner = self.inner.lock();
            inner.working -= 1;
            if inner.working == 0 && inner.queue.is_empty() {
                self.work_cond.notify_one();
            }
        }
    }

}

#[cfg(unix)]
fn try_set_thread_priority(priority: i32) -> bool {
    // SAFETY: `pthread_self` returns the calling thread's own handle; setting
    // its scheduling priority via `setpriority` on that handle cannot affect
    // any other thread's memory or control flow. Failure is reported via the
    // syscall's return value and treated as "keep the existing priority".
    unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, priority) == 0 }
}

#[cfg(not(unix))]
fn try_set_thread_priority(_priority: i32) -> bool {
    false
}

impl svcrt_core::Component for ThreadPool {
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
        ThreadPool::start(self);
    }

    fn stop(&self) {
        ThreadPool::stop(self);
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
