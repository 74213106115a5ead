#![forbid(unsafe_code)]

//! Elm-style runtime for terminal applications.
//!
//! The program runtime manages the update/view loop, handling events and
//! rendering frames. It separates state (Model) from rendering (View) and
//! provides a command pattern for side effects.
//!
//! # Example
//!
//! ```ignore
//! use navshell_runtime::program::{Cmd, Model};
//! use navshell_core::event::Event;
//! use navshell_render::frame::Frame;
//!
//! struct Counter {
//!     count: i32,
//! }
//!
//! enum Msg {
//!     Increment,
//!     Quit,
//! }
//!
//! impl From<Event> for Msg {
//!     fn from(event: Event) -> Self {
//!         match event {
//!             Event::Key(k) if k.is_char('q') => Msg::Quit,
//!             _ => Msg::Increment,
//!         }
//!     }
//! }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
//!         match msg {
//!             Msg::Increment => { self.count += 1; Cmd::none() }
//!             Msg::Quit => Cmd::quit(),
//!         }
//!     }
//!
//!     fn view(&self, frame: &mut Frame) {}
//! }
//! ```

use std::io::{self, Stdout, Write};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::{cursor, event as cte, execute, terminal};
use navshell_core::event::Event;
use navshell_render::buffer::Buffer;
use navshell_render::frame::Frame;
use navshell_render::presenter::Presenter;
use tracing::{debug, debug_span, info};

use crate::subscription::{Subscription, SubscriptionManager};

/// The Model trait defines application state and behavior.
pub trait Model: Sized {
    /// The message type for this model. Must be convertible from terminal events.
    type Message: From<Event> + Send + 'static;

    /// Initialize the model with startup commands.
    ///
    /// Called once when the program starts.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Update the model in response to a message.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Render the current state to a frame.
    fn view(&self, frame: &mut Frame);

    /// Declare active subscriptions.
    ///
    /// Called after each `update()`. The runtime compares the returned set
    /// (by `SubId`) against running subscriptions and starts/stops as needed.
    /// Returning an empty vec stops all subscriptions.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }

    /// Called once when the runtime stops driving the model.
    ///
    /// After this returns the runtime reconciles subscriptions one last time
    /// and discards any messages still in flight.
    fn unmount(&mut self) {}
}

/// Commands represent side effects to be executed by the runtime.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Quit the application.
    Quit,
    /// Execute multiple commands in order.
    Batch(Vec<Cmd<M>>),
    /// Send a message to the model.
    Msg(M),
    /// Execute a blocking operation on a background thread.
    ///
    /// The return value is sent back as a message to the model.
    Task(String, Box<dyn FnOnce() -> M + Send>),
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Task(name, _) => f.debug_struct("Task").field("name", name).finish(),
        }
    }
}

impl<M> Cmd<M> {
    /// Create a no-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a quit command.
    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    /// Create a message command.
    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Create a batch of commands, collapsing empty and single-element batches.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        if cmds.len() > 1 {
            Self::Batch(cmds)
        } else {
            cmds.pop().unwrap_or(Self::None)
        }
    }

    /// Create a named background task command.
    pub fn task_named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(name.into(), Box::new(f))
    }

    /// Whether this is the no-op command.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Return a stable name for tracing.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Msg(_) => "Msg",
            Self::Task(..) => "Task",
        }
    }

    /// Count the atomic commands: 0 for None, recursive for Batch.
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Batch(cmds) => cmds.iter().map(Self::count).sum(),
            _ => 1,
        }
    }
}

/// Program configuration.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Enable mouse capture.
    pub mouse: bool,
    /// Input poll timeout; bounds how long subscription messages wait.
    pub poll_timeout: Duration,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            mouse: false,
            poll_timeout: Duration::from_millis(50),
        }
    }
}

/// Puts the terminal in raw alt-screen mode and restores it on drop.
struct TerminalSession {
    mouse: bool,
}

impl TerminalSession {
    fn enter(mouse: bool) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
        if mouse {
            execute!(stdout, cte::EnableMouseCapture)?;
        }
        Ok(Self { mouse })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.mouse {
            let _ = execute!(stdout, cte::DisableMouseCapture);
        }
        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// The program runtime that manages the update/view loop.
pub struct Program<M: Model, W: Write = Stdout> {
    model: M,
    presenter: Presenter<W>,
    /// Last presented buffer, for row diffing.
    previous: Option<Buffer>,
    config: ProgramConfig,
    running: bool,
    dirty: bool,
    width: u16,
    height: u16,
    subscriptions: SubscriptionManager<M::Message>,
    task_sender: mpsc::Sender<M::Message>,
    task_receiver: mpsc::Receiver<M::Message>,
    task_handles: Vec<JoinHandle<()>>,
    // Declared last so the terminal is restored after everything else drops.
    _session: Option<TerminalSession>,
}

impl<M: Model> Program<M, Stdout> {
    /// Create a new program on the real terminal.
    pub fn with_config(model: M, config: ProgramConfig) -> io::Result<Self> {
        let session = TerminalSession::enter(config.mouse)?;
        let (width, height) = terminal::size()?;
        let mut program = Self::with_writer(model, config, io::stdout(), width, height);
        program._session = Some(session);
        Ok(program)
    }
}

impl<M: Model, W: Write> Program<M, W> {
    /// Create a program that renders into `writer` at a fixed size.
    ///
    /// No terminal mode changes are made; input still comes from crossterm.
    fn with_writer(model: M, config: ProgramConfig, writer: W, width: u16, height: u16) -> Self {
        let (task_sender, task_receiver) = mpsc::channel();
        Self {
            model,
            presenter: Presenter::new(writer),
            previous: None,
            config,
            running: true,
            dirty: true,
            width: width.max(1),
            height: height.max(1),
            subscriptions: SubscriptionManager::new(),
            task_sender,
            task_receiver,
            task_handles: Vec::new(),
            _session: None,
        }
    }

    /// Run the main event loop until a `Cmd::Quit`.
    pub fn run(&mut self) -> io::Result<()> {
        let result = self.run_event_loop();

        let _span = debug_span!("navshell.program.unmount").entered();
        self.model.unmount();
        self.reconcile_subscriptions();
        self.subscriptions.stop_all();
        self.reap_finished_tasks();
        info!(tasks_in_flight = self.task_handles.len(), "program stopped");

        result
    }

    fn run_event_loop(&mut self) -> io::Result<()> {
        let cmd = {
            let _span = debug_span!("navshell.program.init").entered();
            self.model.init()
        };
        self.execute_cmd(cmd)?;
        self.reconcile_subscriptions();
        self.render_frame()?;

        let mut loop_count: u64 = 0;
        while self.running {
            loop_count += 1;
            if loop_count.is_multiple_of(100) {
                crate::debug_trace!("main loop heartbeat: iteration {}", loop_count);
            }

            if cte::poll(self.config.poll_timeout)? {
                loop {
                    if let Some(event) = Event::from_crossterm(cte::read()?) {
                        self.handle_event(event)?;
                    }
                    if !self.running || !cte::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }

            self.process_subscription_messages()?;
            self.process_task_results()?;
            self.reap_finished_tasks();

            if self.dirty && self.running {
                self.render_frame()?;
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        if let Event::Resize { width, height } = event {
            debug!(width, height, "Resize event received");
            self.width = width.max(1);
            self.height = height.max(1);
            self.previous = None;
            self.presenter.reset();
            self.presenter.clear_screen()?;
        }
        self.dispatch(M::Message::from(event), "event")
    }

    /// Run one message through `update`, execute the resulting command, and
    /// reconcile subscriptions.
    fn dispatch(&mut self, msg: M::Message, source: &'static str) -> io::Result<()> {
        let cmd = {
            let _span = debug_span!(
                "navshell.program.update",
                msg_source = source,
                duration_us = tracing::field::Empty,
                cmd_type = tracing::field::Empty
            )
            .entered();
            let start = Instant::now();
            let cmd = self.model.update(msg);
            tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);
            tracing::Span::current().record("cmd_type", cmd.type_name());
            cmd
        };
        self.dirty = true;
        self.execute_cmd(cmd)?;
        self.reconcile_subscriptions();
        Ok(())
    }

    fn reconcile_subscriptions(&mut self) {
        let before = self.subscriptions.active_count();
        self.subscriptions.reconcile(self.model.subscriptions());
        let after = self.subscriptions.active_count();
        if before != after {
            crate::debug_trace!("subscriptions reconcile: before={}, after={}", before, after);
        }
    }

    fn process_subscription_messages(&mut self) -> io::Result<()> {
        for msg in self.subscriptions.drain_messages() {
            if !self.running {
                break;
            }
            self.dispatch(msg, "subscription")?;
        }
        Ok(())
    }

    fn process_task_results(&mut self) -> io::Result<()> {
        while self.running {
            let Ok(msg) = self.task_receiver.try_recv() else {
                break;
            };
            self.dispatch(msg, "task")?;
        }
        Ok(())
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) -> io::Result<()> {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(m) => {
                let cmd = self.model.update(m);
                self.dirty = true;
                self.execute_cmd(cmd)?;
            }
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c)?;
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Task(name, f) => {
                debug!(task = %name, "spawning task");
                let sender = self.task_sender.clone();
                let handle = std::thread::Builder::new()
                    .name(if name.is_empty() { "navshell-task".into() } else { name })
                    .spawn(move || {
                        let _ = sender.send(f());
                    })?;
                self.task_handles.push(handle);
            }
        }
        Ok(())
    }

    fn reap_finished_tasks(&mut self) {
        if self.task_handles.is_empty() {
            return;
        }
        let mut remaining = Vec::with_capacity(self.task_handles.len());
        for handle in self.task_handles.drain(..) {
            if !handle.is_finished() {
                remaining.push(handle);
                continue;
            }
            if let Err(payload) = handle.join() {
                let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_owned()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic payload".to_owned()
                };
                tracing::error!("spawned task panicked: {msg}");
            }
        }
        self.task_handles = remaining;
    }

    fn render_frame(&mut self) -> io::Result<()> {
        let _span = debug_span!("navshell.program.render", width = self.width, height = self.height)
            .entered();
        let mut frame = if self.config.mouse {
            Frame::with_hit_grid(self.width, self.height)
        } else {
            Frame::new(self.width, self.height)
        };
        self.model.view(&mut frame);
        self.presenter.present(self.previous.as_ref(), &frame.buffer)?;
        self.previous = Some(frame.buffer);
        self.dirty = false;
        Ok(())
    }
}
