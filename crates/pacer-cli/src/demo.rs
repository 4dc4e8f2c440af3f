// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Showcase scenario: timed steps, a nested coroutine, an event with
//! prioritized listeners and a reporter that ends the run.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::Instant;

use pacer_rt::{
    from_fn, global, Coroutine, CoroutineHandle, Event, ResumeStats, StartOptions, Step, Wait,
};

use crate::config::DemoConfig;
use crate::output;

pub const FIRST_NAME: &str = "Awesome Waiting Coroutine";

/// What the reporter saw when the first coroutine had finished.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Summary {
    pub name: String,
    pub elapsed_seconds: f64,
    pub stats: ResumeStats,
}

/// Timestamped line sink shared by the coroutine bodies.
#[derive(Clone)]
struct Console {
    clock: Rc<Cell<f64>>,
    lines: Rc<RefCell<Vec<String>>>,
    echo: bool,
}

impl Console {
    fn new(echo: bool) -> Self {
        Console {
            clock: Rc::new(Cell::new(0.0)),
            lines: Rc::new(RefCell::new(Vec::new())),
            echo,
        }
    }

    fn say(&self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.echo {
            println!("{} {}", output::clock(self.clock.get()), msg);
        }
        self.lines.borrow_mut().push(msg);
    }

    fn now(&self) -> f64 {
        self.clock.get()
    }
}

/// Run the scenario on this thread's scheduler until the reporter stops it.
///
/// Returns the recorded lines along with the summary.
pub fn run(config: &DemoConfig, echo: bool) -> pacer_rt::Result<(Summary, Vec<String>)> {
    let console = Console::new(echo);
    let done: Rc<RefCell<Option<Summary>>> = Rc::new(RefCell::new(None));
    let test_event = Event::new();

    let first = global::start_with(
        waiting_steps(console.clone()),
        StartOptions::new().name(FIRST_NAME),
    )?;
    global::start_with(
        reporter(console.clone(), first, done.clone()),
        StartOptions::new().name("reporter"),
    )?;
    global::start(from_fn(|_| Step::Done))?;

    let c = console.clone();
    global::invoke_later(Wait::seconds(5.0), move |sched| {
        c.say("Raising test event");
        if let Err(e) = sched.raise_event(test_event) {
            log::error!("test event listener failed: {}", e);
        }
    })?;
    let listeners = [
        ("Example event received", 0),
        ("I am invoked after 'Example event received'", -5),
        ("I am invoked before 'Example event received'", 2),
    ];
    for (msg, priority) in listeners {
        let c = console.clone();
        global::invoke_later_with(
            Wait::event(test_event),
            move |_| c.say(msg),
            StartOptions::new().priority(priority),
        )?;
    }

    log::debug!(
        "demo running: tick {:?}, scale {}, simulate {}",
        config.tick_interval,
        config.time_scale,
        config.simulate
    );
    let mut last = Instant::now();
    let summary = loop {
        if let Some(summary) = done.borrow_mut().take() {
            break summary;
        }
        let delta = if config.simulate {
            config.tick_interval.as_secs_f64()
        } else {
            let now = Instant::now();
            let real = now.duration_since(last).as_secs_f64();
            last = now;
            real
        } * config.time_scale;
        console.clock.set(console.now() + delta);
        global::tick(delta)?;
        if !config.simulate {
            thread::sleep(config.tick_interval);
        }
    };

    let lines = console.lines.borrow().clone();
    Ok((summary, lines))
}

fn waiting_steps(console: Console) -> impl Coroutine {
    let mut stage = 0;
    from_fn(move |sched| {
        stage += 1;
        match stage {
            1 => {
                console.say("First thing");
                Step::Wait(Wait::seconds(1.0))
            }
            2 => {
                console.say("After 1 second");
                Step::Wait(Wait::seconds(9.0))
            }
            3 => {
                console.say("After 10 seconds");
                let options = StartOptions::new().name("nested");
                if let Err(e) = sched.start_with(nested(console.clone()), options) {
                    log::error!("nested coroutine failed to start: {}", e);
                }
                Step::Wait(Wait::seconds(5.0))
            }
            4 => {
                console.say("After 5 more seconds");
                Step::Wait(Wait::seconds(10.0))
            }
            5 => {
                console.say("After 10 more seconds");
                Step::Wait(Wait::seconds(20.0))
            }
            _ => {
                console.say("First coroutine done");
                Step::Done
            }
        }
    })
}

fn nested(console: Console) -> impl Coroutine {
    let mut started = false;
    from_fn(move |_| {
        if !started {
            started = true;
            console.say("I'm a coroutine that was started from another coroutine!");
            return Step::Wait(Wait::seconds(5.0));
        }
        console.say("It's been 5 seconds since a nested coroutine was started, yay!");
        Step::Done
    })
}

fn reporter(
    console: Console,
    first: CoroutineHandle,
    done: Rc<RefCell<Option<Summary>>>,
) -> impl Coroutine {
    let mut waited = false;
    from_fn(move |_| {
        if !waited {
            waited = true;
            return Step::Wait(Wait::seconds(10.0));
        }
        console.say(format!("{:.0} seconds have passed", console.now()));
        if !first.is_finished() {
            return Step::Wait(Wait::seconds(10.0));
        }
        let stats = first.stats();
        console.say("By the way, the first coroutine has finished!");
        console.say(format!(
            "{} data: {} resumes, {:.3}ms total time, {:.3}ms last time",
            first.name(),
            stats.resume_count,
            stats.total.as_secs_f64() * 1000.0,
            stats.last.as_secs_f64() * 1000.0,
        ));
        *done.borrow_mut() = Some(Summary {
            name: first.name().to_string(),
            elapsed_seconds: console.now(),
            stats,
        });
        Step::Done
    })
}
