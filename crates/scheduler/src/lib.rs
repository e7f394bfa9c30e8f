// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! svcrt-scheduler: single-dispatcher periodic scheduler built on top of
//! `svcrt-pool`.

mod factory;
mod schedule;
mod scheduler;

pub use factory::{SchedulerFactory, SCHEDULER_TYPE};
pub use schedule::Schedule;
pub use scheduler::Scheduler;
