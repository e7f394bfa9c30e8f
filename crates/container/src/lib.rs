// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! svcrt-container: process-wide factory registry glue plus the
//! insertion-ordered instance map that drives component lifecycles.

mod container;

pub use container::{ComponentSummary, Container};
