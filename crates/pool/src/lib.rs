// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Per-job/default thread priority is set through a raw `libc::setpriority`
// call; see `pool::try_set_thread_priority`.
#![allow(unsafe_code)]

//! svcrt-pool: bounded, priority-ordered worker pool.

mod factory;
mod job;
mod pool;

pub use factory::{ThreadPoolFactory, THREAD_POOL_TYPE};
pub use job::Job;
pub use pool::ThreadPool;
