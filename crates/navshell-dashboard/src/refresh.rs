#![forbid(unsafe_code)]

//! Subscription refresh controller.
//!
//! `begin` decides whether a refresh needs a fetch; the caller runs the fetch
//! as a background task and feeds the result back through `complete`. The
//! controller counts fetches in flight so `loading` stays true until the last
//! overlapping fetch has reported, and every issued fetch reports exactly once.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use navshell_runtime::Lifetime;

use crate::auth::User;
use crate::billing::{BillingError, BillingService, FetchResult, SubscriptionSnapshot};
use crate::cache::SnapshotCache;

/// What a refresh request did when issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nobody is signed in; nothing happened.
    SkippedNoUser,
    /// A fresh snapshot is cached and the request was not forced.
    CacheHit,
    /// A fetch was issued.
    Started,
    /// The owner is gone; nothing happened.
    Cancelled,
}

/// How a completed fetch was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The snapshot replaced the cache entry.
    Stored,
    /// A newer snapshot was already cached; this one was dropped.
    Superseded,
    /// The fetch failed; the previous entry is untouched.
    Failed,
    /// The owner is gone; nothing was touched.
    Discarded,
}

#[derive(Debug, Default)]
pub struct RefreshController {
    cache: SnapshotCache,
    in_flight: usize,
    issued: u64,
    last_result: Option<Result<(), BillingError>>,
}

impl RefreshController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a refresh at `now` needs a fetch.
    ///
    /// On `Started` the caller must run exactly one fetch and pass its result
    /// to [`complete`](Self::complete).
    pub fn begin(
        &mut self,
        user: Option<&User>,
        force: bool,
        now: Duration,
        lifetime: &Lifetime,
    ) -> RefreshOutcome {
        if lifetime.is_cancelled() {
            return RefreshOutcome::Cancelled;
        }
        if user.is_none() {
            return RefreshOutcome::SkippedNoUser;
        }
        if !force && self.cache.is_fresh_at(now) {
            return RefreshOutcome::CacheHit;
        }
        self.in_flight += 1;
        self.issued += 1;
        RefreshOutcome::Started
    }

    /// Apply the result of a fetch issued at `issued_at`.
    ///
    /// After `lifetime` is cancelled this touches nothing, not even the
    /// in-flight count.
    pub fn complete(
        &mut self,
        result: FetchResult,
        issued_at: Duration,
        lifetime: &Lifetime,
    ) -> Completion {
        if lifetime.is_cancelled() {
            return Completion::Discarded;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(snapshot) => {
                let stored = self.cache.store(snapshot, issued_at);
                self.last_result = Some(Ok(()));
                if stored {
                    Completion::Stored
                } else {
                    Completion::Superseded
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "error checking subscription");
                self.last_result = Some(Err(err));
                Completion::Failed
            }
        }
    }

    /// True while any fetch is in flight.
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Fetches issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn snapshot(&self) -> Option<&SubscriptionSnapshot> {
        self.cache.snapshot()
    }

    /// Drop the cached snapshot; fetches issued before `now` will report
    /// [`Completion::Superseded`].
    pub fn forget(&mut self, now: Duration) {
        self.cache.clear(now);
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Result of the most recent completed fetch.
    pub fn last_result(&self) -> Option<&Result<(), BillingError>> {
        self.last_result.as_ref()
    }
}

/// Run one fetch against `billing`, the body of the background task.
///
/// Skips the call when `lifetime` is already cancelled and turns a panic in
/// the collaborator into [`BillingError::Panicked`], so a result always comes
/// back.
pub fn fetch(billing: &dyn BillingService, user_id: &str, lifetime: &Lifetime) -> FetchResult {
    if lifetime.is_cancelled() {
        return Err(BillingError::Cancelled);
    }
    panic::catch_unwind(AssertUnwindSafe(|| billing.check_subscription_access(user_id)))
        .unwrap_or_else(|payload| {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_owned()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_owned()
            };
            Err(BillingError::Panicked(msg))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::FixedBilling;

    fn user() -> User {
        User::new("u-1", "owner@example.com")
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    struct Exploding;

    impl BillingService for Exploding {
        fn check_subscription_access(&self, _user_id: &str) -> FetchResult {
            panic!("backend exploded")
        }
    }

    #[test]
    fn no_user_is_a_no_op() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        assert_eq!(ctl.begin(None, true, secs(0), &life), RefreshOutcome::SkippedNoUser);
        assert!(!ctl.loading());
        assert_eq!(ctl.issued(), 0);
    }

    #[test]
    fn cache_hit_within_window() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        let u = user();
        assert_eq!(ctl.begin(Some(&u), false, secs(0), &life), RefreshOutcome::Started);
        ctl.complete(Ok(SubscriptionSnapshot::trial(3)), secs(0), &life);

        assert_eq!(ctl.begin(Some(&u), false, secs(4), &life), RefreshOutcome::CacheHit);
        assert_eq!(ctl.begin(Some(&u), false, secs(5), &life), RefreshOutcome::Started);
        assert_eq!(ctl.issued(), 2);
    }

    #[test]
    fn forced_always_fetches() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        let u = user();
        ctl.begin(Some(&u), false, secs(0), &life);
        ctl.complete(Ok(SubscriptionSnapshot::trial(3)), secs(0), &life);
        assert_eq!(ctl.begin(Some(&u), true, secs(0), &life), RefreshOutcome::Started);
    }

    #[test]
    fn loading_tracks_overlapping_fetches() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        let u = user();
        ctl.begin(Some(&u), true, secs(0), &life);
        ctl.begin(Some(&u), true, secs(1), &life);
        assert_eq!(ctl.in_flight(), 2);

        ctl.complete(Ok(SubscriptionSnapshot::trial(2)), secs(1), &life);
        assert!(ctl.loading());
        ctl.complete(Err(BillingError::Unavailable("503".into())), secs(0), &life);
        assert!(!ctl.loading());
    }

    #[test]
    fn failure_keeps_previous_entry() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        let u = user();
        ctl.begin(Some(&u), true, secs(0), &life);
        ctl.complete(Ok(SubscriptionSnapshot::trial(3)), secs(0), &life);
        ctl.begin(Some(&u), true, secs(10), &life);
        let done = ctl.complete(Err(BillingError::Unavailable("down".into())), secs(10), &life);

        assert_eq!(done, Completion::Failed);
        assert_eq!(ctl.snapshot().and_then(|s| s.days_remaining), Some(3));
        assert!(matches!(ctl.last_result(), Some(Err(BillingError::Unavailable(_)))));
    }

    #[test]
    fn cancelled_lifetime_blocks_both_ends() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        let u = user();
        ctl.begin(Some(&u), true, secs(0), &life);
        life.cancel();

        let done = ctl.complete(Ok(SubscriptionSnapshot::trial(1)), secs(0), &life);
        assert_eq!(done, Completion::Discarded);
        assert!(ctl.snapshot().is_none());
        assert_eq!(ctl.in_flight(), 1);
        assert_eq!(ctl.begin(Some(&u), true, secs(1), &life), RefreshOutcome::Cancelled);
    }

    #[test]
    fn late_older_result_is_superseded() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        let u = user();
        ctl.begin(Some(&u), true, secs(0), &life);
        ctl.begin(Some(&u), true, secs(6), &life);
        ctl.complete(Ok(SubscriptionSnapshot::trial(1)), secs(6), &life);
        let done = ctl.complete(Ok(SubscriptionSnapshot::trial(9)), secs(0), &life);
        assert_eq!(done, Completion::Superseded);
        assert_eq!(ctl.snapshot().and_then(|s| s.days_remaining), Some(1));
    }

    #[test]
    fn forget_refuses_fetches_issued_before() {
        let mut ctl = RefreshController::new();
        let life = Lifetime::new();
        let u = user();
        ctl.begin(Some(&u), true, secs(0), &life);
        ctl.complete(Ok(SubscriptionSnapshot::trial(3)), secs(0), &life);
        ctl.begin(Some(&u), true, secs(2), &life);

        ctl.forget(secs(3));
        assert!(ctl.snapshot().is_none());
        let done = ctl.complete(Ok(SubscriptionSnapshot::trial(8)), secs(2), &life);
        assert_eq!(done, Completion::Superseded);
        assert!(ctl.snapshot().is_none());
        assert!(!ctl.loading());

        assert_eq!(ctl.begin(Some(&u), false, secs(3), &life), RefreshOutcome::Started);
    }

    #[test]
    fn fetch_converts_panic() {
        let result = fetch(&Exploding, "u-1", &Lifetime::new());
        match result {
            Err(BillingError::Panicked(msg)) => assert!(msg.contains("exploded")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fetch_skips_when_cancelled() {
        let life = Lifetime::new();
        life.cancel();
        assert!(matches!(
            fetch(&FixedBilling::default(), "u-1", &life),
            Err(BillingError::Cancelled)
        ));
    }
}
