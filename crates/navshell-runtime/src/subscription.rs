#![forbid(unsafe_code)]

//! Subscription system for timers and other continuous event sources.
//!
//! Subscriptions are declarative: the runtime manages their lifecycles based
//! on what the model declares as active.
//!
//! # How it works
//!
//! 1. `Model::subscriptions()` returns the set of active subscriptions
//! 2. After each `update()`, the runtime compares active vs previous subscriptions
//! 3. New subscriptions are started, removed ones are stopped
//! 4. Subscription messages are routed through `Model::update()`
//!
//! Timer subscriptions ([`Every`], [`After`]) also describe themselves through
//! [`Subscription::timer`] so the simulator can fire them on virtual time
//! instead of spawning threads.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// A unique identifier for a subscription.
///
/// Used to track which subscriptions are active and to deduplicate
/// subscriptions across update cycles.
pub type SubId = u64;

/// Firing schedule of a timer subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Fires repeatedly, `interval` apart, first after one interval.
    Every(Duration),
    /// Fires once, `delay` after it was started.
    Once(Duration),
}

/// A subscription produces messages from an external event source.
///
/// Subscriptions run on background threads and send messages through the
/// provided channel. The runtime manages their lifecycle.
pub trait Subscription<M: Send + 'static>: Send {
    /// Unique identifier for deduplication.
    ///
    /// Subscriptions with the same ID are considered identical; the runtime
    /// does not restart an unchanged subscription.
    fn id(&self) -> SubId;

    /// Run the subscription on a background thread, sending messages until
    /// the stop signal fires or the receiver is dropped.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);

    /// Schedule of a pure timer, `None` for other event sources.
    fn timer(&self) -> Option<Timer> {
        None
    }

    /// The message a timer emits when it fires.
    fn fire(&self) -> Option<M> {
        None
    }
}

/// Signal for stopping a subscription.
///
/// The subscription should check it periodically (or wait on it) and exit its
/// run loop when set.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    pub fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: inner.clone(),
        };
        (signal, StopTrigger { inner })
    }

    /// Check if the stop signal has been triggered.
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        // A poisoned lock means the stopping side panicked; treat as stopped.
        lock.lock().map(|stopped| *stopped).unwrap_or(true)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out. Spurious wakeups are
    /// absorbed by looping until the deadline.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let Ok(mut stopped) = lock.lock() else {
            return true;
        };
        let deadline = Instant::now() + duration;

        loop {
            if *stopped {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match cvar.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => stopped = guard,
                Err(_) => return true,
            }
        }
    }
}

/// Trigger to stop a subscription from the runtime side.
pub struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    /// Signal the subscription to stop.
    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        if let Ok(mut stopped) = lock.lock() {
            *stopped = true;
        }
        cvar.notify_all();
    }
}

/// A running subscription handle.
pub(crate) struct RunningSubscription {
    pub(crate) id: SubId,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningSubscription {
    /// Stop the subscription and join its thread.
    pub(crate) fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            tracing::warn!(sub_id = self.id, "subscription thread panicked");
        }
    }
}

impl Drop for RunningSubscription {
    fn drop(&mut self) {
        // Don't join in drop to avoid blocking.
        self.trigger.stop();
    }
}

/// Manages the lifecycle of subscriptions for a program.
pub(crate) struct SubscriptionManager<M: Send + 'static> {
    active: Vec<RunningSubscription>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> SubscriptionManager<M> {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            active: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Update the set of active subscriptions.
    ///
    /// - Starts subscriptions that are new (ID not in active set)
    /// - Stops subscriptions that are no longer declared
    /// - Leaves unchanged subscriptions running
    pub(crate) fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let new_ids: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();
        let active_before = self.active.len();

        crate::debug_trace!(
            "reconcile: new_ids={:?}, active_before={}",
            new_ids,
            active_before
        );

        let mut remaining = Vec::new();
        for running in self.active.drain(..) {
            if new_ids.contains(&running.id) {
                remaining.push(running);
            } else {
                crate::debug_trace!("stopping subscription: id={}", running.id);
                tracing::debug!(sub_id = running.id, "Stopping subscription");
                running.stop();
            }
        }
        self.active = remaining;

        let mut active_ids: HashSet<SubId> = self.active.iter().map(|r| r.id).collect();
        for sub in subscriptions {
            let id = sub.id();
            if !active_ids.insert(id) {
                continue;
            }

            crate::debug_trace!("starting subscription: id={}", id);
            tracing::debug!(sub_id = id, "Starting subscription");
            let (signal, trigger) = StopSignal::new();
            let sender = self.sender.clone();
            let thread = thread::spawn(move || {
                sub.run(sender, signal);
            });

            self.active.push(RunningSubscription {
                id,
                trigger,
                thread: Some(thread),
            });
        }

        tracing::trace!(
            active_before,
            active_after = self.active.len(),
            "subscription reconcile complete"
        );
    }

    /// Drain pending messages from subscriptions.
    pub(crate) fn drain_messages(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    /// Wait up to `timeout` for the first message, then drain the rest.
    pub(crate) fn wait_messages(&self, timeout: Duration) -> Vec<M> {
        let mut messages = Vec::new();
        if let Ok(first) = self.receiver.recv_timeout(timeout) {
            messages.push(first);
            messages.extend(self.receiver.try_iter());
        }
        messages
    }

    /// IDs of running subscriptions, in start order.
    pub(crate) fn active_ids(&self) -> Vec<SubId> {
        self.active.iter().map(|r| r.id).collect()
    }

    /// Number of active subscriptions.
    #[inline]
    pub(crate) fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Stop all running subscriptions.
    pub(crate) fn stop_all(&mut self) {
        for running in self.active.drain(..) {
            running.stop();
        }
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// --- Built-in subscriptions ---

/// A subscription that fires at a fixed interval.
///
/// ```ignore
/// fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
///     vec![Box::new(Every::with_id(POLL_ID, Duration::from_secs(6), || Msg::Poll))]
/// }
/// ```
pub struct Every<M: Send + 'static> {
    id: SubId,
    interval: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Every<M> {
    /// Create a repeating timer with an explicit ID.
    pub fn with_id(
        id: SubId,
        interval: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            interval,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for Every<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        let mut tick_count: u64 = 0;
        crate::debug_trace!(
            "Every subscription started: id={}, interval={:?}",
            self.id,
            self.interval
        );
        loop {
            if stop.wait_timeout(self.interval) {
                crate::debug_trace!(
                    "Every subscription stopped: id={}, sent {} ticks",
                    self.id,
                    tick_count
                );
                break;
            }
            tick_count += 1;
            if sender.send((self.make_msg)()).is_err() {
                break;
            }
        }
    }

    fn timer(&self) -> Option<Timer> {
        Some(Timer::Every(self.interval))
    }

    fn fire(&self) -> Option<M> {
        Some((self.make_msg)())
    }
}

/// A subscription that fires once after a delay.
///
/// The delay restarts only if the subscription is stopped (its ID no longer
/// declared) and declared again; give each logical timer instance its own ID.
pub struct After<M: Send + 'static> {
    id: SubId,
    delay: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> After<M> {
    /// Create a one-shot timer with an explicit ID.
    pub fn with_id(
        id: SubId,
        delay: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            delay,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for After<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        if stop.wait_timeout(self.delay) {
            crate::debug_trace!("After subscription cancelled: id={}", self.id);
            return;
        }
        let _ = sender.send((self.make_msg)());
    }

    fn timer(&self) -> Option<Timer> {
        Some(Timer::Once(self.delay))
    }

    fn fire(&self) -> Option<M> {
        Some((self.make_msg)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestMsg {
        Tick,
        Value(i32),
    }

    #[test]
    fn stop_signal_starts_false() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.is_stopped());
    }

    #[test]
    fn stop_signal_becomes_true_after_trigger() {
        let (signal, trigger) = StopSignal::new();
        trigger.stop();
        assert!(signal.is_stopped());
    }

    #[test]
    fn stop_signal_wait_returns_false_on_timeout() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn stop_signal_wait_is_interrupted_by_trigger() {
        let (signal, trigger) = StopSignal::new();
        let handle = thread::spawn(move || signal.wait_timeout(Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        trigger.stop();
        assert!(handle.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn every_subscription_fires() {
        let sub = Every::with_id(1, Duration::from_millis(10), || TestMsg::Tick);
        let (tx, rx) = mpsc::channel();
        let (signal, trigger) = StopSignal::new();

        let handle = thread::spawn(move || sub.run(tx, signal));
        thread::sleep(Duration::from_millis(50));
        trigger.stop();
        handle.join().unwrap();

        let msgs: Vec<_> = rx.try_iter().collect();
        assert!(!msgs.is_empty());
        assert!(msgs.iter().all(|m| *m == TestMsg::Tick));
    }

    #[test]
    fn timers_describe_their_schedule() {
        let every = Every::with_id(1, Duration::from_secs(6), || TestMsg::Tick);
        let after = After::with_id(2, Duration::from_secs(1), || TestMsg::Value(7));

        assert_eq!(every.timer(), Some(Timer::Every(Duration::from_secs(6))));
        assert_eq!(after.timer(), Some(Timer::Once(Duration::from_secs(1))));
        assert_eq!(after.fire(), Some(TestMsg::Value(7)));
    }

    #[test]
    fn after_fires_once() {
        let sub = After::with_id(5, Duration::from_millis(5), || TestMsg::Value(5));
        let (tx, rx) = mpsc::channel();
        let (signal, _trigger) = StopSignal::new();
        sub.run(tx, signal);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![TestMsg::Value(5)]);
    }

    #[test]
    fn after_cancelled_before_delay_sends_nothing() {
        let sub = After::with_id(5, Duration::from_secs(10), || TestMsg::Value(5));
        let (tx, rx) = mpsc::channel();
        let (signal, trigger) = StopSignal::new();
        let handle = thread::spawn(move || sub.run(tx, signal));
        trigger.stop();
        handle.join().unwrap();
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn manager_starts_subscriptions() {
        let mut mgr = SubscriptionManager::<TestMsg>::new();
        mgr.reconcile(vec![Box::new(After::with_id(1, Duration::ZERO, || {
            TestMsg::Value(42)
        }))]);
        let msgs = mgr.wait_messages(Duration::from_secs(1));
        assert_eq!(msgs, vec![TestMsg::Value(42)]);
    }

    #[test]
    fn manager_dedupes_duplicate_ids() {
        let mut mgr = SubscriptionManager::<TestMsg>::new();
        mgr.reconcile(vec![
            Box::new(After::with_id(7, Duration::ZERO, || TestMsg::Value(1))),
            Box::new(After::with_id(7, Duration::ZERO, || TestMsg::Value(2))),
        ]);
        assert_eq!(mgr.active_count(), 1);
        let msgs = mgr.wait_messages(Duration::from_secs(1));
        assert_eq!(msgs, vec![TestMsg::Value(1)]);
    }

    #[test]
    fn manager_stops_removed() {
        let mut mgr = SubscriptionManager::<TestMsg>::new();
        mgr.reconcile(vec![Box::new(Every::with_id(
            99,
            Duration::from_millis(5),
            || TestMsg::Tick,
        ))]);
        assert!(!mgr.wait_messages(Duration::from_secs(1)).is_empty());

        mgr.reconcile(vec![]);
        assert_eq!(mgr.active_count(), 0);
        // The thread was joined, so nothing new can arrive after this drain.
        let _ = mgr.drain_messages();
        thread::sleep(Duration::from_millis(30));
        assert!(mgr.drain_messages().is_empty());
    }

    #[test]
    fn manager_keeps_unchanged() {
        let mut mgr = SubscriptionManager::<TestMsg>::new();
        mgr.reconcile(vec![Box::new(Every::with_id(
            50,
            Duration::from_millis(10),
            || TestMsg::Tick,
        ))]);
        mgr.reconcile(vec![Box::new(Every::with_id(
            50,
            Duration::from_millis(10),
            || TestMsg::Tick,
        ))]);
        assert_eq!(mgr.active_ids(), vec![50]);
        assert!(!mgr.wait_messages(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn manager_stop_all() {
        let mut mgr = SubscriptionManager::<TestMsg>::new();
        mgr.reconcile(vec![
            Box::new(Every::with_id(1, Duration::from_millis(5), || {
                TestMsg::Value(1)
            })),
            Box::new(Every::with_id(2, Duration::from_millis(5), || {
                TestMsg::Value(2)
            })),
        ]);
        mgr.stop_all();
        assert_eq!(mgr.active_count(), 0);
        let _ = mgr.drain_messages();
        thread::sleep(Duration::from_millis(30));
        assert!(mgr.drain_messages().is_empty());
    }
}
