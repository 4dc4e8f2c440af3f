// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Pacer runtime: a single-threaded cooperative coroutine scheduler.
//!
//! Coroutines are resumable computations that suspend on a [`Wait`]:
//! either an amount of time or an [`Event`]. Nothing runs on its own.
//! The caller pumps the scheduler with two calls:
//! [`Scheduler::tick`] to advance time and [`Scheduler::raise_event`]
//! to wake event waiters.
//!
//! Components:
//! - `event`    : identity-only wake tokens
//! - `wait`     : suspension descriptors (duration or event)
//! - `coroutine`: the resumable computation contract and adapters
//! - `handle`   : CoroutineHandle: run state, statistics, finish callbacks
//! - `scheduler`: partitions, priority order, deferred mutation
//! - `global`   : thread-local convenience facade over one scheduler

pub mod coroutine;
pub mod error;
pub mod event;
pub mod global;
pub mod handle;
pub mod scheduler;
pub mod wait;

pub use coroutine::{from_fn, from_iter, BoxError, Coroutine, Step, StepResult};
pub use error::{Error, Result};
pub use event::Event;
pub use handle::{CoroutineHandle, ResumeStats, RunState};
pub use scheduler::{Scheduler, StartOptions};
pub use wait::Wait;
