// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Thread-local convenience facade.
//!
//! One [`Scheduler`] per thread, reachable without passing it around.
//! Every function forwards to that instance.

use std::time::Duration;

use crate::coroutine::Coroutine;
use crate::error::Result;
use crate::event::Event;
use crate::handle::CoroutineHandle;
use crate::scheduler::{Scheduler, StartOptions};
use crate::wait::Wait;

thread_local! {
    static SCHEDULER: Scheduler = Scheduler::new();
}

/// Run `f` against this thread's scheduler.
pub fn with<R>(f: impl FnOnce(&Scheduler) -> R) -> R {
    SCHEDULER.with(f)
}

pub fn start<C: Coroutine + 'static>(coroutine: C) -> Result<CoroutineHandle> {
    with(|s| s.start(coroutine))
}

pub fn start_with<C: Coroutine + 'static>(
    coroutine: C,
    options: StartOptions,
) -> Result<CoroutineHandle> {
    with(|s| s.start_with(coroutine, options))
}

pub fn invoke_later<A>(wait: Wait, action: A) -> Result<CoroutineHandle>
where
    A: FnOnce(&Scheduler) + 'static,
{
    with(|s| s.invoke_later(wait, action))
}

pub fn invoke_later_with<A>(wait: Wait, action: A, options: StartOptions) -> Result<CoroutineHandle>
where
    A: FnOnce(&Scheduler) + 'static,
{
    with(|s| s.invoke_later_with(wait, action, options))
}

pub fn tick(delta_seconds: f64) -> Result<()> {
    with(|s| s.tick(delta_seconds))
}

pub fn tick_duration(delta: Duration) -> Result<()> {
    with(|s| s.tick_duration(delta))
}

pub fn raise_event(evt: Event) -> Result<()> {
    with(|s| s.raise_event(evt))
}

pub fn stop(handle: &CoroutineHandle) -> bool {
    with(|s| s.stop(handle))
}

pub fn active_coroutines() -> Vec<CoroutineHandle> {
    with(Scheduler::active_coroutines)
}

pub fn ticking_count() -> usize {
    with(Scheduler::ticking_count)
}

pub fn event_count() -> usize {
    with(Scheduler::event_count)
}
