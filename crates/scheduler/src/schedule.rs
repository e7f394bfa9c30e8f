// SPDX-License-Identifier: MIT

//! A single recurring (or one-shot) unit of scheduled work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use svcrt_pool::ThreadPool;

/// `repeat = None` means run forever; `Some(n)` means run `n` more times
/// before the scheduler automatically deletes the schedule. Mirrors the
/// original's `repeat` parameter where `0` means infinite.
pub type RepeatCount = Option<u64>;

pub(crate) struct ScheduleInner {
    pub(crate) func: Box<dyn FnMut() + Send>,
    pub(crate) remaining: RepeatCount,
}

/// A schedule: a periodic function bound to a target pool, with optional
/// run/abort callbacks and a free-callback fired once when the schedule is
/// finally dropped (the Rust analogue of `iot_schedule_free_fn_t`, invoked
/// here via `Drop` instead of an explicit C free function).
pub struct Schedule {
    pub(crate) id: u64,
    pub(crate) period: Duration,
    pub(crate) pool: Arc<ThreadPool>,
    pub(crate) priority: Option<i32>,
    pub(crate) inner: Mutex<ScheduleInner>,
    pub(crate) run_callback: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    pub(crate) abort_callback: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    pub(crate) on_free: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    dropped: AtomicU64,
}

impl Schedule {
    pub(crate) fn new(
        id: u64,
        period: Duration,
        repeat: RepeatCount,
        pool: Arc<ThreadPool>,
        priority: Option<i32>,
        func: Box<dyn FnMut() + Send>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            period,
            pool,
            priority,
            inner: Mutex::new(ScheduleInner {
                func,
                remaining: repeat,
            }),
            run_callback: Mutex::new(None),
            abort_callback: Mutex::new(None),
            on_free: Mutex::new(None),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        if let Some(cb) = self.abort_callback.lock().as_ref() {
            cb();
        }
    }

    pub fn add_run_callback(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.run_callback.lock() = Some(Box::new(f));
    }

    pub fn add_abort_callback(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.abort_callback.lock() = Some(Box::new(f));
    }

    /// Registers a callback run exactly once, when this schedule is finally
    /// torn down (all `Arc` handles dropped). The equivalent of the
    /// original's per-schedule argument free-function.
    pub fn on_free(&self, f: impl FnOnce() + Send + 'static) {
        *self.on_free.lock() = Some(Box::new(f));
    }

    /// True once the repeat budget is exhausted and the schedule should be
    /// retired by the dispatcher.
    pub(crate) fn exhausted_after_run(&self) -> bool {
        let mut inner = self.inner.lock();
        match &mut inner.remaining {
            None => false,
            Some(n) if *n <= 1 => {
                *n = 0;
                true
            }
            Some(n) => {
                *n -= 1;
                false
            }
        }
    }
}

impl Drop for Schedule {
    fn drop(&mut self) {
        if let Some(f) = self.on_free.get_mut().take() {
            f();
        }
    }
}
