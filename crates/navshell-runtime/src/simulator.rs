#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] without a real terminal:
//!
//! - events and messages are injected directly;
//! - tasks run synchronously, or are queued when deferred so tests can
//!   interleave completions with other messages;
//! - timer subscriptions ([`Timer`]) fire on virtual time through
//!   [`advance_time`](ProgramSimulator::advance_time), which also drives the
//!   shared [`ManualClock`];
//! - other subscriptions (e.g. bus listeners) run on real threads and are
//!   drained with [`pump_subscriptions`](ProgramSimulator::pump_subscriptions).
//!
//! ```ignore
//! use navshell_runtime::simulator::ProgramSimulator;
//!
//! let mut sim = ProgramSimulator::new(Counter { value: 0 });
//! sim.init();
//! sim.send(Msg::Increment);
//! assert_eq!(sim.model().value, 1);
//!
//! let buf = sim.capture_frame(80, 24);
//! ```

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use navshell_core::event::Event;
use navshell_render::buffer::Buffer;
use navshell_render::frame::Frame;

use crate::clock::{Clock, ManualClock};
use crate::program::{Cmd, Model};
use crate::subscription::{SubId, Subscription, SubscriptionManager, Timer};

/// Record of a command that was executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    /// No-op command.
    None,
    /// Quit command.
    Quit,
    /// Message sent to model.
    Msg,
    /// Batch of commands.
    Batch(usize),
    /// Background task, by name.
    Task(String),
}

type PendingTask<M> = (String, Box<dyn FnOnce() -> M + Send>);

/// A timer subscription being driven on virtual time.
struct VirtualTimer<M: Send + 'static> {
    id: SubId,
    sub: Box<dyn Subscription<M>>,
    timer: Timer,
    next_due: Duration,
    done: bool,
}

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    model: M,
    clock: ManualClock,
    last_frame: Option<Buffer>,
    command_log: Vec<CmdRecord>,
    running: bool,
    defer_tasks: bool,
    pending_tasks: VecDeque<PendingTask<M::Message>>,
    timers: Vec<VirtualTimer<M::Message>>,
    live: SubscriptionManager<M::Message>,
}

impl<M: Model> ProgramSimulator<M> {
    /// Create a new simulator with its own clock.
    ///
    /// The model is not initialized until [`init`](Self::init) is called.
    pub fn new(model: M) -> Self {
        Self::with_clock(model, ManualClock::new())
    }

    /// Create a simulator that advances `clock`; pass a clone of the clock
    /// the model reads so both see the same virtual time.
    pub fn with_clock(model: M, clock: ManualClock) -> Self {
        Self {
            model,
            clock,
            last_frame: None,
            command_log: Vec::new(),
            running: true,
            defer_tasks: false,
            pending_tasks: VecDeque::new(),
            timers: Vec::new(),
            live: SubscriptionManager::new(),
        }
    }

    /// Call `Model::init()`, execute its commands, and start subscriptions.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.reconcile();
    }

    /// Inject a terminal event, converted via `From<Event>`.
    pub fn inject_event(&mut self, event: Event) {
        self.send(M::Message::from(event));
    }

    /// Send a message through `Model::update()`, execute the returned
    /// commands, and reconcile subscriptions.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
        self.reconcile();
    }

    /// Call `Model::unmount()` and reconcile what the model still declares.
    pub fn unmount(&mut self) {
        self.model.unmount();
        self.reconcile();
    }

    /// Queue tasks instead of running them inline.
    pub fn defer_tasks(&mut self, defer: bool) {
        self.defer_tasks = defer;
    }

    /// Number of queued tasks.
    pub fn pending_task_count(&self) -> usize {
        self.pending_tasks.len()
    }

    /// Run queued tasks in FIFO order and deliver their messages.
    ///
    /// Tasks queued by those messages run too. Returns how many ran.
    pub fn run_pending_tasks(&mut self) -> usize {
        let mut ran = 0;
        while let Some((_, task)) = self.pending_tasks.pop_front() {
            ran += 1;
            let msg = task();
            self.send(msg);
        }
        ran
    }

    /// Advance virtual time by `delta`, firing due timers in deadline order.
    ///
    /// The clock is set to each timer's deadline before its message is
    /// delivered, then to the final time.
    pub fn advance_time(&mut self, delta: Duration) {
        let target = self.clock.now() + delta;
        while self.running {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| !t.done && t.next_due <= target)
                .min_by_key(|(_, t)| t.next_due)
                .map(|(i, _)| i);
            let Some(idx) = next else {
                break;
            };

            let timer = &mut self.timers[idx];
            self.clock.set(timer.next_due);
            let msg = timer.sub.fire();
            match timer.timer {
                Timer::Every(interval) if !interval.is_zero() => timer.next_due += interval,
                _ => timer.done = true,
            }
            crate::debug_trace!("virtual timer fired: id={}", timer.id);

            if let Some(msg) = msg {
                self.send(msg);
            }
        }
        self.clock.set(target);
    }

    /// Wait up to `timeout` for thread-backed subscriptions to produce
    /// messages and deliver them. Returns how many were delivered.
    pub fn pump_subscriptions(&mut self, timeout: Duration) -> usize {
        let messages = self.live.wait_messages(timeout);
        let count = messages.len();
        for msg in messages {
            self.send(msg);
        }
        count
    }

    /// IDs of the subscriptions currently running (timers and live).
    pub fn subscription_ids(&self) -> Vec<SubId> {
        let mut ids: Vec<SubId> = self
            .timers
            .iter()
            .filter(|t| !t.done)
            .map(|t| t.id)
            .collect();
        ids.extend(self.live.active_ids());
        ids
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Render the model at the given size, with hit regions, and keep the
    /// buffer until the next capture.
    pub fn capture_frame(&mut self, width: u16, height: u16) -> &Buffer {
        let mut frame = Frame::with_hit_grid(width, height);
        self.model.view(&mut frame);
        self.last_frame.insert(frame.buffer)
    }

    /// Get a reference to the model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// `false` after a `Cmd::Quit` has been executed.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get the command execution log.
    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Number of task commands executed or queued so far, optionally by name.
    pub fn task_count(&self, name: Option<&str>) -> usize {
        self.command_log
            .iter()
            .filter(|r| match (r, name) {
                (CmdRecord::Task(_), None) => true,
                (CmdRecord::Task(n), Some(want)) => n == want,
                _ => false,
            })
            .count()
    }

    fn reconcile(&mut self) {
        let declared = self.model.subscriptions();
        let ids: HashSet<SubId> = declared.iter().map(|s| s.id()).collect();
        self.timers.retain(|t| ids.contains(&t.id));

        let mut known: HashSet<SubId> = self.timers.iter().map(|t| t.id).collect();
        let now = self.clock.now();
        let mut live = Vec::new();
        for sub in declared {
            let Some(timer) = sub.timer() else {
                live.push(sub);
                continue;
            };
            let id = sub.id();
            if !known.insert(id) {
                continue;
            }
            let delay = match timer {
                Timer::Every(d) | Timer::Once(d) => d,
            };
            self.timers.push(VirtualTimer {
                id,
                sub,
                timer,
                next_due: now + delay,
                done: false,
            });
        }
        self.live.reconcile(live);
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {
                self.command_log.push(CmdRecord::None);
            }
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Task(name, f) => {
                self.command_log.push(CmdRecord::Task(name.clone()));
                if self.defer_tasks {
                    self.pending_tasks.push_back((name, f));
                } else {
                    let msg = f();
                    let cmd = self.model.update(msg);
                    self.execute_cmd(cmd);
                }
            }
        }
    }
}
