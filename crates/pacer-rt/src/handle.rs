// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Coroutine handles.
//!
//! A handle owns one resumable computation and records what it is
//! waiting on, whether it has finished, how long its steps take, and
//! who wants to hear about its end. The scheduler drives it through
//! `resume_step`; callers observe it and may `cancel` it.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use crate::coroutine::{Coroutine, Step};
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::wait::Wait;

static NEXT_COROUTINE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle lifecycle. `Canceled` counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RunState {
    Active,
    Finished,
    Canceled,
}

/// Timing of a handle's resume steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResumeStats {
    pub resume_count: u64,
    pub total: Duration,
    pub max: Duration,
    pub last: Duration,
}

impl ResumeStats {
    /// `total / resume_count`, zero before the first resume.
    pub fn average(&self) -> Duration {
        if self.resume_count == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.total.as_secs_f64() / self.resume_count as f64)
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.resume_count = self.resume_count.saturating_add(1);
        self.total += elapsed;
        self.last = elapsed;
        if elapsed > self.max {
            self.max = elapsed;
        }
    }
}

type FinishCallback = Box<dyn FnOnce(&CoroutineHandle)>;

struct Inner {
    id: u64,
    name: String,
    priority: i32,
    /// `None` while a step is running and after the handle finishes.
    body: RefCell<Option<Box<dyn Coroutine>>>,
    wait: Cell<Wait>,
    state: Cell<RunState>,
    resuming: Cell<bool>,
    stats: Cell<ResumeStats>,
    on_finished: RefCell<Vec<FinishCallback>>,
}

/// Shared reference to one running (or finished) coroutine.
///
/// Clones refer to the same coroutine; equality is identity.
#[derive(Clone)]
pub struct CoroutineHandle {
    inner: Rc<Inner>,
}

impl CoroutineHandle {
    pub(crate) fn new(body: Box<dyn Coroutine>, name: String, priority: i32) -> Self {
        Self {
            inner: Rc::new(Inner {
                id: NEXT_COROUTINE_ID.fetch_add(1, AtomicOrdering::Relaxed),
                name,
                priority,
                body: RefCell::new(Some(body)),
                wait: Cell::new(Wait::default()),
                state: Cell::new(RunState::Active),
                resuming: Cell::new(false),
                stats: Cell::new(ResumeStats::default()),
                on_finished: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Process-unique id.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Higher runs earlier among handles woken by the same pump call.
    pub fn priority(&self) -> i32 {
        self.inner.priority
    }

    pub fn state(&self) -> RunState {
        self.inner.state.get()
    }

    pub fn is_finished(&self) -> bool {
        self.state() != RunState::Active
    }

    pub fn was_canceled(&self) -> bool {
        self.state() == RunState::Canceled
    }

    /// The wait most recently yielded. Meaningless once finished.
    pub fn current_wait(&self) -> Wait {
        self.inner.wait.get()
    }

    pub fn stats(&self) -> ResumeStats {
        self.inner.stats.get()
    }

    pub fn resume_count(&self) -> u64 {
        self.stats().resume_count
    }

    pub fn total_resume_time(&self) -> Duration {
        self.stats().total
    }

    pub fn max_resume_time(&self) -> Duration {
        self.stats().max
    }

    pub fn last_resume_time(&self) -> Duration {
        self.stats().last
    }

    pub fn average_resume_time(&self) -> Duration {
        self.stats().average()
    }

    /// Run `f` once this coroutine finishes, by completion or cancel.
    ///
    /// Callbacks run in registration order. If the handle has already
    /// finished, `f` runs immediately.
    pub fn on_finished<F>(&self, f: F)
    where
        F: FnOnce(&CoroutineHandle) + 'static,
    {
        if self.is_finished() {
            f(self);
        } else {
            self.inner.on_finished.borrow_mut().push(Box::new(f));
        }
    }

    /// Cancel the coroutine. Returns false if it had already finished.
    ///
    /// Finish callbacks run before this returns. The scheduler notices
    /// the cancel on its next pass and drops the handle.
    pub fn cancel(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        log::debug!("coroutine #{} `{}` canceled", self.id(), self.name());
        self.finish(RunState::Canceled);
        true
    }

    /// Descending priority; equal priorities compare equal so arrival
    /// order decides.
    pub fn schedule_order(&self, other: &CoroutineHandle) -> Ordering {
        other.priority().cmp(&self.priority())
    }

    pub(crate) fn is_resuming(&self) -> bool {
        self.inner.resuming.get()
    }

    /// Advance the current duration wait. True once it has elapsed.
    pub(crate) fn advance_time(&self, delta: f64) -> bool {
        let mut wait = self.inner.wait.get();
        let elapsed = wait.advance_time(delta);
        self.inner.wait.set(wait);
        elapsed
    }

    /// Run the body up to its next suspension. Returns true if the
    /// handle is finished afterwards.
    ///
    /// On error nothing about the handle changes.
    ///
    /// # Panics
    ///
    /// Panics if the handle has finished or is already mid-step.
    pub(crate) fn resume_step(&self, sched: &Scheduler) -> Result<bool> {
        assert!(
            !self.is_finished(),
            "coroutine #{} `{}` resumed after it finished",
            self.id(),
            self.name()
        );
        let Some(mut body) = self.inner.body.borrow_mut().take() else {
            panic!("coroutine #{} `{}` resumed re-entrantly", self.id(), self.name());
        };

        self.inner.resuming.set(true);
        let started = Instant::now();
        let outcome = body.resume(sched);
        let elapsed = started.elapsed();
        self.inner.resuming.set(false);

        let step = match outcome {
            Ok(step) => step,
            Err(source) => {
                if !self.is_finished() {
                    *self.inner.body.borrow_mut() = Some(body);
                }
                return Err(Error::Resume {
                    coroutine: self.id(),
                    name: self.name().to_string(),
                    source,
                });
            }
        };

        let mut stats = self.inner.stats.get();
        stats.record(elapsed);
        self.inner.stats.set(stats);
        log::trace!(
            "coroutine #{} `{}` resumed in {:?}",
            self.id(),
            self.name(),
            elapsed
        );

        // Canceled from inside its own step: the yield no longer matters.
        if self.is_finished() {
            return Ok(true);
        }

        match step {
            Step::Wait(wait) => {
                self.inner.wait.set(wait);
                *self.inner.body.borrow_mut() = Some(body);
                Ok(false)
            }
            Step::Done => {
                drop(body);
                log::debug!("coroutine #{} `{}` finished", self.id(), self.name());
                self.finish(RunState::Finished);
                Ok(true)
            }
        }
    }

    fn finish(&self, state: RunState) {
        self.inner.state.set(state);
        // A body parked between steps is dropped now; one that is
        // mid-step is dropped by resume_step when it returns.
        let body = self.inner.body.borrow_mut().take();
        drop(body);
        let callbacks = std::mem::take(&mut *self.inner.on_finished.borrow_mut());
        for callback in callbacks {
            callback(self);
        }
    }
}

impl PartialEq for CoroutineHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for CoroutineHandle {}

impl Hash for CoroutineHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for CoroutineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoroutineHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("priority", &self.priority())
            .field("state", &self.state())
            .field("wait", &self.current_wait())
            .finish()
    }
}
