// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cooperative scheduler.
//!
//! Active handles live in one of two partitions: the ticking list
//! (duration waits) or a per-event list. Each list is kept in
//! descending priority, ties in arrival order.
//!
//! Resuming a handle runs arbitrary code that may start, stop or raise
//! from inside a scan. Partitions are therefore never restructured while
//! a pump call (`tick` / `raise_event`) is on the stack: insertions are
//! queued, removals are marked, and the outermost pump call applies both
//! on entry and on exit. Scans walk their list by index, which stays
//! valid because the list cannot change underneath them.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;

use indexmap::IndexMap;

use crate::coroutine::{Coroutine, InvokeLater};
use crate::error::Result;
use crate::event::Event;
use crate::handle::CoroutineHandle;
use crate::wait::Wait;

/// Name and priority for a newly started coroutine.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub name: String,
    pub priority: i32,
}

impl StartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Which partition a handle sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Ticking,
    Event(Event),
}

impl Slot {
    fn of(wait: &Wait) -> Self {
        match wait.event_key() {
            Some(evt) => Slot::Event(evt),
            None => Slot::Ticking,
        }
    }
}

#[derive(Default)]
struct Partitions {
    ticking: Vec<CoroutineHandle>,
    events: IndexMap<Event, Vec<CoroutineHandle>>,
    /// Handles waiting to be filed, in arrival order.
    pending: Vec<CoroutineHandle>,
    /// Entries to drop from their partition, keyed by handle id.
    removals: HashSet<(Slot, u64)>,
}

impl Partitions {
    fn list(&self, slot: Slot) -> Option<&Vec<CoroutineHandle>> {
        match slot {
            Slot::Ticking => Some(&self.ticking),
            Slot::Event(evt) => self.events.get(&evt),
        }
    }

    fn handle_at(&self, slot: Slot, index: usize) -> Option<CoroutineHandle> {
        self.list(slot).and_then(|list| list.get(index)).cloned()
    }

    fn len_of(&self, slot: Slot) -> usize {
        self.list(slot).map_or(0, Vec::len)
    }

    fn contains(&self, slot: Slot, handle: &CoroutineHandle) -> bool {
        self.list(slot).is_some_and(|list| list.contains(handle))
    }

    /// File `handle` after every entry of equal or higher priority.
    fn insert(&mut self, handle: CoroutineHandle) {
        let list = match Slot::of(&handle.current_wait()) {
            Slot::Ticking => &mut self.ticking,
            Slot::Event(evt) => self.events.entry(evt).or_default(),
        };
        let position =
            list.partition_point(|existing| existing.schedule_order(&handle) != Ordering::Greater);
        list.insert(position, handle);
    }

    /// Apply queued removals and insertions.
    fn flush(&mut self) {
        let removed = self.removals.len();
        let added = self.pending.len();
        if removed == 0 && added == 0 {
            return;
        }

        if !self.removals.is_empty() {
            let removals = std::mem::take(&mut self.removals);
            self.ticking
                .retain(|h| !removals.contains(&(Slot::Ticking, h.id())));
            for (evt, list) in self.events.iter_mut() {
                list.retain(|h| !removals.contains(&(Slot::Event(*evt), h.id())));
            }
            self.events.retain(|_, list| !list.is_empty());
        }

        for handle in std::mem::take(&mut self.pending) {
            if !handle.is_finished() {
                self.insert(handle);
            }
        }
        log::debug!("scheduler flushed {} removal(s), {} insertion(s)", removed, added);
    }
}

/// Single-threaded coroutine scheduler.
///
/// All methods take `&self`; coroutine bodies receive the same reference
/// and may call back in. Independent schedulers share nothing. The type
/// is `!Send`: one logical thread pumps it.
#[derive(Default)]
pub struct Scheduler {
    parts: RefCell<Partitions>,
    /// Number of pump calls currently on the stack.
    depth: Cell<usize>,
}

/// Marks a pump call in progress; flushes when the outermost one ends.
struct Pump<'a> {
    sched: &'a Scheduler,
}

impl<'a> Pump<'a> {
    fn enter(sched: &'a Scheduler) -> Self {
        if sched.depth.get() == 0 {
            sched.parts.borrow_mut().flush();
        }
        sched.depth.set(sched.depth.get() + 1);
        Self { sched }
    }
}

impl Drop for Pump<'_> {
    fn drop(&mut self) {
        let depth = self.sched.depth.get() - 1;
        self.sched.depth.set(depth);
        if depth == 0 {
            // A panic while a partition is borrowed leaves nothing to flush safely.
            if let Ok(mut parts) = self.sched.parts.try_borrow_mut() {
                parts.flush();
            }
        }
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a coroutine with default name and priority.
    pub fn start<C>(&self, coroutine: C) -> Result<CoroutineHandle>
    where
        C: Coroutine + 'static,
    {
        self.start_with(coroutine, StartOptions::default())
    }

    /// Start a coroutine, running it up to its first suspension.
    ///
    /// A coroutine that completes right away comes back finished and is
    /// never filed. If the first step fails the error is returned and
    /// the coroutine is dropped.
    pub fn start_with<C>(&self, coroutine: C, options: StartOptions) -> Result<CoroutineHandle>
    where
        C: Coroutine + 'static,
    {
        let handle = CoroutineHandle::new(Box::new(coroutine), options.name, options.priority);
        log::debug!(
            "starting coroutine #{} `{}` (priority {})",
            handle.id(),
            handle.name(),
            handle.priority()
        );
        if handle.resume_step(self)? {
            return Ok(handle);
        }
        // The first step may have canceled it.
        if handle.is_finished() {
            return Ok(handle);
        }

        let mut parts = self.parts.borrow_mut();
        if self.depth.get() == 0 {
            parts.insert(handle.clone());
        } else {
            parts.pending.push(handle.clone());
        }
        Ok(handle)
    }

    /// Run `action` once `wait` resolves.
    pub fn invoke_later<A>(&self, wait: Wait, action: A) -> Result<CoroutineHandle>
    where
        A: FnOnce(&Scheduler) + 'static,
    {
        self.invoke_later_with(wait, action, StartOptions::default())
    }

    pub fn invoke_later_with<A>(
        &self,
        wait: Wait,
        action: A,
        options: StartOptions,
    ) -> Result<CoroutineHandle>
    where
        A: FnOnce(&Scheduler) + 'static,
    {
        self.start_with(InvokeLater::new(wait, action), options)
    }

    /// Advance every duration wait by `delta_seconds`, resuming the ones
    /// that elapse, highest priority first.
    ///
    /// Call this regularly even when only event waits exist: it also
    /// files coroutines queued by earlier nested calls.
    pub fn tick(&self, delta_seconds: f64) -> Result<()> {
        let _pump = Pump::enter(self);

        let len = self.parts.borrow().len_of(Slot::Ticking);
        for index in 0..len {
            let Some(handle) = self.claim(Slot::Ticking, index) else {
                continue;
            };
            if !handle.advance_time(delta_seconds) {
                continue;
            }
            let finished = handle.resume_step(self)?;
            self.refile(Slot::Ticking, &handle, finished);
        }
        Ok(())
    }

    pub fn tick_duration(&self, delta: Duration) -> Result<()> {
        self.tick(delta.as_secs_f64())
    }

    /// Resume every coroutine waiting on `evt`, highest priority first.
    ///
    /// Coroutines that start waiting on `evt` during this call are only
    /// woken by a later raise.
    pub fn raise_event(&self, evt: Event) -> Result<()> {
        let _pump = Pump::enter(self);
        let slot = Slot::Event(evt);

        let len = self.parts.borrow().len_of(slot);
        for index in 0..len {
            let Some(handle) = self.claim(slot, index) else {
                continue;
            };
            if !handle.current_wait().matches_event(evt) {
                continue;
            }
            let finished = handle.resume_step(self)?;
            self.refile(slot, &handle, finished);
        }
        Ok(())
    }

    /// Remove `handle` from this scheduler and cancel it.
    ///
    /// Returns false if the handle has already finished or is not
    /// scheduled here.
    pub fn stop(&self, handle: &CoroutineHandle) -> bool {
        if handle.is_finished() {
            return false;
        }
        {
            let mut parts = self.parts.borrow_mut();
            let slot = Slot::of(&handle.current_wait());
            if let Some(pos) = parts.pending.iter().position(|h| h == handle) {
                parts.pending.remove(pos);
            } else if parts.contains(slot, handle) {
                parts.removals.insert((slot, handle.id()));
                if self.depth.get() == 0 {
                    parts.flush();
                }
            } else {
                return false;
            }
        }
        log::debug!("stopping coroutine #{} `{}`", handle.id(), handle.name());
        handle.cancel()
    }

    /// Snapshot of every active handle: the ticking list, then each
    /// event list, then any not yet filed.
    pub fn active_coroutines(&self) -> Vec<CoroutineHandle> {
        let parts = self.parts.borrow();
        parts
            .ticking
            .iter()
            .chain(parts.events.values().flatten())
            .chain(parts.pending.iter())
            .filter(|h| !h.is_finished())
            .cloned()
            .collect()
    }

    /// Entries in the ticking partition.
    pub fn ticking_count(&self) -> usize {
        self.parts.borrow().ticking.len()
    }

    /// Entries across all event partitions.
    pub fn event_count(&self) -> usize {
        self.parts.borrow().events.values().map(Vec::len).sum()
    }

    /// True when nothing is scheduled or waiting to be filed.
    pub fn is_idle(&self) -> bool {
        let parts = self.parts.borrow();
        parts.ticking.is_empty() && parts.events.is_empty() && parts.pending.is_empty()
    }

    /// Fetch the handle at `index` if this scan should visit it.
    ///
    /// Finished handles are marked for removal and skipped, as are
    /// handles already marked in this pass and handles whose step is on
    /// the stack.
    fn claim(&self, slot: Slot, index: usize) -> Option<CoroutineHandle> {
        let mut parts = self.parts.borrow_mut();
        let handle = parts.handle_at(slot, index)?;
        if parts.removals.contains(&(slot, handle.id())) || handle.is_resuming() {
            return None;
        }
        if handle.is_finished() {
            parts.removals.insert((slot, handle.id()));
            return None;
        }
        Some(handle)
    }

    /// After a resume: drop finished handles and move handles whose new
    /// wait belongs to another partition.
    fn refile(&self, slot: Slot, handle: &CoroutineHandle, finished: bool) {
        let mut parts = self.parts.borrow_mut();
        if finished || handle.is_finished() {
            parts.removals.insert((slot, handle.id()));
            return;
        }
        if Slot::of(&handle.current_wait()) != slot {
            parts.removals.insert((slot, handle.id()));
            parts.pending.push(handle.clone());
        }
    }
}
