// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resumable computations.
//!
//! A coroutine is anything that, when resumed, runs synchronously until
//! it either yields a [`Wait`] or reports that it is done. The scheduler
//! depends on nothing else: explicit state machines, closures and
//! iterators all fit.

use crate::scheduler::Scheduler;
use crate::wait::Wait;

/// Error type a coroutine body may fail with.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Outcome of one resume step.
pub type StepResult = Result<Step, BoxError>;

/// What a single resume produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Suspend until this wait resolves.
    Wait(Wait),
    /// The computation has finished.
    Done,
}

impl From<Wait> for Step {
    fn from(wait: Wait) -> Self {
        Step::Wait(wait)
    }
}

/// A computation the scheduler can drive step by step.
///
/// `resume` receives the scheduler that is driving it so a body can
/// start, stop or raise without holding on to the scheduler itself.
pub trait Coroutine {
    fn resume(&mut self, sched: &Scheduler) -> StepResult;
}

impl<F> Coroutine for F
where
    F: FnMut(&Scheduler) -> StepResult,
{
    fn resume(&mut self, sched: &Scheduler) -> StepResult {
        self(sched)
    }
}

/// Coroutine from an infallible step function.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&Scheduler) -> Step,
{
    FromFn { f }
}

pub struct FromFn<F> {
    f: F,
}

impl<F> Coroutine for FromFn<F>
where
    F: FnMut(&Scheduler) -> Step,
{
    fn resume(&mut self, sched: &Scheduler) -> StepResult {
        Ok((self.f)(sched))
    }
}

/// Coroutine from a sequence of waits. It finishes when the iterator
/// runs dry; side effects go in the iterator's adapters.
pub fn from_iter<I>(iter: I) -> FromIter<I::IntoIter>
where
    I: IntoIterator<Item = Wait>,
{
    FromIter {
        iter: iter.into_iter(),
    }
}

pub struct FromIter<I> {
    iter: I,
}

impl<I> Coroutine for FromIter<I>
where
    I: Iterator<Item = Wait>,
{
    fn resume(&mut self, _sched: &Scheduler) -> StepResult {
        Ok(self.iter.next().map_or(Step::Done, Step::Wait))
    }
}

/// Waits once, then runs `action` and finishes. Backs `invoke_later`.
pub(crate) struct InvokeLater<A> {
    wait: Option<Wait>,
    action: Option<A>,
}

impl<A> InvokeLater<A>
where
    A: FnOnce(&Scheduler),
{
    pub(crate) fn new(wait: Wait, action: A) -> Self {
        Self {
            wait: Some(wait),
            action: Some(action),
        }
    }
}

impl<A> Coroutine for InvokeLater<A>
where
    A: FnOnce(&Scheduler),
{
    fn resume(&mut self, sched: &Scheduler) -> StepResult {
        if let Some(wait) = self.wait.take() {
            return Ok(Step::Wait(wait));
        }
        if let Some(action) = self.action.take() {
            action(sched);
        }
        Ok(Step::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn from_iter_yields_then_finishes() {
        let sched = Scheduler::new();
        let mut co = from_iter([Wait::seconds(1.0), Wait::seconds(2.0)]);
        assert_eq!(co.resume(&sched).unwrap(), Step::Wait(Wait::seconds(1.0)));
        assert_eq!(co.resume(&sched).unwrap(), Step::Wait(Wait::seconds(2.0)));
        assert_eq!(co.resume(&sched).unwrap(), Step::Done);
    }

    #[test]
    fn invoke_later_runs_action_on_second_resume() {
        let sched = Scheduler::new();
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        let mut co = InvokeLater::new(Wait::seconds(5.0), move |_: &Scheduler| r.set(true));

        assert_eq!(co.resume(&sched).unwrap(), Step::Wait(Wait::seconds(5.0)));
        assert!(!ran.get());
        assert_eq!(co.resume(&sched).unwrap(), Step::Done);
        assert!(ran.get());
    }

    #[test]
    fn closures_can_fail() {
        let sched = Scheduler::new();
        let mut co = |_: &Scheduler| -> StepResult { Err("nope".into()) };
        assert_eq!(co.resume(&sched).unwrap_err().to_string(), "nope");
    }
}
