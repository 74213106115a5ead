#![forbid(unsafe_code)]

//! navshell runtime
//!
//! Ties the core and render crates into an Elm-style application runtime.
//!
//! # Key Components
//!
//! - [`Program`] - terminal update/view loop
//! - [`Model`] - trait for application state and behavior
//! - [`Cmd`] - commands for side effects
//! - [`Subscription`] - trait for continuous event sources, with the
//!   built-in [`Every`] and [`After`] timers
//! - [`SignalBus`] - typed pub/sub shared between components, bridged into
//!   subscriptions by [`BusSubscription`]
//! - [`Lifetime`] - cancellation token tied to a mounted model
//! - [`Clock`] - time source, [`ManualClock`] for tests
//! - [`ProgramSimulator`] - deterministic, terminal-free driver for tests

pub mod bus;
pub mod clock;
pub mod debug_trace;
pub mod lifetime;
pub mod program;
pub mod simulator;
pub mod subscription;

pub use bus::{BusSubscription, Listener, SignalBus};
pub use clock::{Clock, ManualClock, MonotonicClock, SharedClock};
pub use lifetime::Lifetime;
pub use program::{Cmd, Model, Program, ProgramConfig};
pub use simulator::{CmdRecord, ProgramSimulator};
pub use subscription::{After, Every, StopSignal, StopTrigger, SubId, Subscription, Timer};
