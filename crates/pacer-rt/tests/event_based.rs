// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Event-wait behavior.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pacer_rt::{from_fn, from_iter, Event, Scheduler, StartOptions, Step, Wait};

#[test]
fn event_based_coroutine() {
    let sched = Scheduler::new();
    let counter = Rc::new(Cell::new(0));
    let my_event = Event::new();

    let c = counter.clone();
    let mut stage = 0;
    let cr = sched
        .start(from_fn(move |_| {
            stage += 1;
            c.set(c.get() + 1);
            if stage == 1 {
                Step::Wait(Wait::event(my_event))
            } else {
                Step::Done
            }
        }))
        .unwrap();

    assert_eq!(counter.get(), 1, "code before the first wait runs on start");
    sched.raise_event(my_event).unwrap();
    assert_eq!(counter.get(), 2);
    sched.raise_event(my_event).unwrap();
    assert_eq!(counter.get(), 2, "a finished coroutine is not resumed again");

    assert!(cr.is_finished());
    assert!(!cr.was_canceled());
    assert_eq!(cr.resume_count(), 2);
}

#[test]
fn unrelated_events_do_not_wake() {
    let sched = Scheduler::new();
    let wanted = Event::new();
    let other = Event::new();
    let cr = sched.start(from_iter([Wait::event(wanted)])).unwrap();

    sched.raise_event(other).unwrap();
    sched.tick(100.0).unwrap();
    assert_eq!(cr.resume_count(), 1);
    assert!(!cr.is_finished());

    sched.raise_event(wanted).unwrap();
    assert!(cr.is_finished());
}

#[test]
fn raising_without_waiters_is_a_no_op() {
    let sched = Scheduler::new();
    sched.raise_event(Event::new()).unwrap();
    assert!(sched.is_idle());
}

#[test]
fn priority_orders_event_waiters() {
    let sched = Scheduler::new();
    let evt = Event::new();
    let shared = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(Vec::new()));

    for priority in [-5, 10] {
        let (shared, seen) = (shared.clone(), seen.clone());
        sched
            .invoke_later_with(
                Wait::event(evt),
                move |_| {
                    shared.set(shared.get() + 1);
                    seen.borrow_mut().push((priority, shared.get()));
                },
                StartOptions::new().priority(priority),
            )
            .unwrap();
    }

    sched.raise_event(evt).unwrap();
    assert_eq!(*seen.borrow(), vec![(10, 1), (-5, 2)]);
    assert_eq!(sched.event_count(), 0);
}

#[test]
fn equal_priority_keeps_arrival_order() {
    let sched = Scheduler::new();
    let evt = Event::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let labels = [("received", 0), ("after", -5), ("before", 2), ("also received", 0)];
    for (label, priority) in labels {
        let seen = seen.clone();
        sched
            .invoke_later_with(
                Wait::event(evt),
                move |_| seen.borrow_mut().push(label),
                StartOptions::new().name(label).priority(priority),
            )
            .unwrap();
    }

    sched.raise_event(evt).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["before", "received", "also received", "after"]
    );
}

#[test]
fn waiters_on_one_event_do_not_see_another() {
    let sched = Scheduler::new();
    let a = Event::new();
    let b = Event::new();
    let on_a = sched.start(from_iter([Wait::event(a)])).unwrap();
    let on_b = sched.start(from_iter([Wait::event(b)])).unwrap();
    assert_eq!(sched.event_count(), 2);

    sched.raise_event(b).unwrap();
    assert!(on_b.is_finished());
    assert!(!on_a.is_finished());
    assert_eq!(sched.event_count(), 1);
}

#[test]
fn event_then_duration() {
    let sched = Scheduler::new();
    let evt = Event::new();
    let cr = sched
        .start(from_iter([Wait::event(evt), Wait::seconds(2.0)]))
        .unwrap();

    sched.tick(5.0).unwrap();
    assert_eq!(cr.resume_count(), 1);

    sched.raise_event(evt).unwrap();
    assert_eq!(sched.event_count(), 0);
    assert_eq!(sched.ticking_count(), 1);

    sched.tick(1.0).unwrap();
    assert!(!cr.is_finished());
    sched.tick(1.0).unwrap();
    assert!(cr.is_finished());
}

#[test]
fn active_coroutines_lists_both_partitions() {
    let sched = Scheduler::new();
    let evt = Event::new();
    let timed = sched.start(from_iter([Wait::seconds(1.0)])).unwrap();
    let evented = sched.start(from_iter([Wait::event(evt)])).unwrap();

    assert_eq!(sched.active_coroutines(), vec![timed.clone(), evented]);

    sched.raise_event(evt).unwrap();
    assert_eq!(sched.active_coroutines(), vec![timed]);
}

#[test]
fn active_coroutines_keeps_events_in_first_seen_order() {
    let sched = Scheduler::new();
    let first = Event::new();
    let second = Event::new();
    // Ids grow with creation order; file the newer event first.
    let on_second = sched.start(from_iter([Wait::event(second)])).unwrap();
    let on_first = sched.start(from_iter([Wait::event(first)])).unwrap();
    let also_second = sched.start(from_iter([Wait::event(second)])).unwrap();
    let timed = sched.start(from_iter([Wait::seconds(1.0)])).unwrap();

    assert_eq!(
        sched.active_coroutines(),
        vec![timed, on_second.clone(), also_second, on_first.clone()]
    );

    sched.raise_event(second).unwrap();
    sched.raise_event(first).unwrap();
    assert!(on_second.is_finished());
    assert!(on_first.is_finished());
    assert_eq!(sched.event_count(), 0);
}
