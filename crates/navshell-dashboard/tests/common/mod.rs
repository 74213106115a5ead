//! Shared fixtures for the shell integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use navshell_dashboard::app::{DashboardShell, ShellDeps};
use navshell_dashboard::auth::{StaticAuth, User};
use navshell_dashboard::billing::{
    BillingEvent, BillingService, FetchResult, SubscriptionSnapshot,
};
use navshell_dashboard::routing::MemoryRouter;
use navshell_runtime::{ManualClock, ProgramSimulator, SignalBus};

/// Billing double that counts calls and replays scripted results, falling
/// back to a fixed snapshot once the script runs out.
pub struct CountingBilling {
    calls: AtomicUsize,
    script: Mutex<VecDeque<FetchResult>>,
    fallback: SubscriptionSnapshot,
}

impl CountingBilling {
    pub fn new(fallback: SubscriptionSnapshot) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    pub fn then(self, result: FetchResult) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BillingService for CountingBilling {
    fn check_subscription_access(&self, _user_id: &str) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

pub struct Fixture {
    pub sim: ProgramSimulator<DashboardShell>,
    pub router: MemoryRouter,
    pub auth: Arc<StaticAuth>,
    pub billing: Arc<CountingBilling>,
    pub bus: SignalBus<BillingEvent>,
}

impl Fixture {
    pub fn fetches(&self) -> usize {
        self.billing.calls()
    }

    pub fn shell(&self) -> &DashboardShell {
        self.sim.model()
    }
}

pub fn owner() -> User {
    User::new("u-1", "owner@example.com")
}

/// Build an un-initialized shell at `url`.
pub fn build(
    url: &str,
    auth: StaticAuth,
    billing: CountingBilling,
    bus: SignalBus<BillingEvent>,
) -> Fixture {
    let clock = ManualClock::new();
    let router = MemoryRouter::new(url);
    let auth = Arc::new(auth);
    let billing = Arc::new(billing);
    let deps = ShellDeps {
        router: Arc::new(router.clone()),
        auth: auth.clone(),
        billing: billing.clone(),
        bus: bus.clone(),
        clock: Arc::new(clock.clone()),
    };
    let sim = ProgramSimulator::with_clock(DashboardShell::new(deps), clock);
    Fixture {
        sim,
        router,
        auth,
        billing,
        bus,
    }
}

/// Signed-in shell on a trial with `days` left, already initialized.
pub fn mount(url: &str, days: i64) -> Fixture {
    let mut fx = build(
        url,
        StaticAuth::signed_in(owner()),
        CountingBilling::new(SubscriptionSnapshot::trial(days)),
        SignalBus::new(),
    );
    fx.sim.init();
    fx
}
