#![forbid(unsafe_code)]

//! Typed publish/subscribe signal bus.
//!
//! A [`SignalBus`] is injected into every component that publishes or reacts
//! to a signal. Each listener owns its own channel, so every live listener
//! receives every publication. No ordering between listeners is promised.
//!
//! A [`Listener`] holds a liveness token; the bus keeps only a weak handle to
//! it. Entries whose listener was dropped are pruned whenever a listener
//! registers or an event is published, so the list never outgrows the number
//! of live listeners plus those dropped since the last registration.
//!
//! [`BusSubscription`] bridges a bus listener into the subscription system so
//! a model hears the bus only while it declares the subscription.

use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::subscription::{StopSignal, SubId, Subscription};

/// How often a bus listener thread re-checks its stop signal.
const LISTEN_POLL: Duration = Duration::from_millis(25);

struct Entry<E> {
    alive: Weak<()>,
    sender: mpsc::Sender<E>,
}

impl<E> Entry<E> {
    fn is_live(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// A cloneable handle to a shared signal bus.
pub struct SignalBus<E> {
    listeners: Arc<Mutex<Vec<Entry<E>>>>,
}

impl<E> Clone for SignalBus<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<E> Default for SignalBus<E> {
    fn default() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E> std::fmt::Debug for SignalBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<E: Clone + Send + 'static> SignalBus<E> {
    /// A bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it receives every event published from now on
    /// until it is dropped.
    pub fn listen(&self) -> Listener<E> {
        let (sender, receiver) = mpsc::channel();
        let token = Arc::new(());
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(Entry::is_live);
            listeners.push(Entry {
                alive: Arc::downgrade(&token),
                sender,
            });
        }
        Listener {
            receiver,
            _token: token,
        }
    }

    /// Deliver `event` to every live listener and return how many received it.
    pub fn publish(&self, event: E) -> usize {
        let Ok(mut listeners) = self.listeners.lock() else {
            tracing::warn!("signal bus lock poisoned; event dropped");
            return 0;
        };
        listeners.retain(|entry| entry.is_live() && entry.sender.send(event.clone()).is_ok());
        let delivered = listeners.len();
        tracing::debug!(delivered, "signal published");
        delivered
    }
}

impl<E> SignalBus<E> {
    /// Number of entries currently registered, live or awaiting pruning.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Receiving end of a bus registration. Dropping it unregisters.
pub struct Listener<E> {
    receiver: mpsc::Receiver<E>,
    _token: Arc<()>,
}

impl<E> Listener<E> {
    pub fn try_recv(&self) -> Result<E, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<E, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Subscription that forwards bus events into model messages.
///
/// The listener is registered when the subscription is constructed, so events
/// published between declaration and thread start are not lost.
pub struct BusSubscription<E, M> {
    id: SubId,
    listener: Mutex<Option<Listener<E>>>,
    map: Box<dyn Fn(E) -> Option<M> + Send + Sync>,
}

impl<E: Clone + Send + 'static, M: Send + 'static> BusSubscription<E, M> {
    /// Listen on `bus`, converting each event with `map` (`None` skips it).
    pub fn new(
        id: SubId,
        bus: &SignalBus<E>,
        map: impl Fn(E) -> Option<M> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            listener: Mutex::new(Some(bus.listen())),
            map: Box::new(map),
        }
    }
}

impl<E: Send + 'static, M: Send + 'static> Subscription<M> for BusSubscription<E, M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        let Some(listener) = self.listener.lock().ok().and_then(|mut l| l.take()) else {
            return;
        };
        crate::debug_trace!("bus subscription started: id={}", self.id);
        while !stop.is_stopped() {
            match listener.recv_timeout(LISTEN_POLL) {
                Ok(event) => {
                    if let Some(msg) = (self.map)(event)
                        && sender.send(msg).is_err()
                    {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        crate::debug_trace!("bus subscription stopped: id={}", self.id);
    }
}
