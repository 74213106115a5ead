#![forbid(unsafe_code)]

//! The dashboard shell model.
//!
//! [`DashboardShell`] owns the navigation chrome around a routed content
//! outlet and keeps a polled subscription snapshot for it. Three triggers
//! refresh the snapshot:
//!
//! 1. mount, and any sign-in announced on the auth provider's change bus,
//!    unforced;
//! 2. a [`BillingEvent::SubscriptionUpdated`] on the shared bus, forced, which
//!    also shows the success banner for [`BANNER_DURATION`];
//! 3. a `payment=success` query at mount: the parameter is stripped, one
//!    forced refresh runs immediately, [`MAX_POLLS`] more follow every
//!    [`POLL_INTERVAL`], and the update signal is re-broadcast once after
//!    [`REBROADCAST_DELAY`].
//!
//! Timers and the bus listeners are declared from [`Model::subscriptions`], so
//! the runtime starts and stops them as state changes. A successful sign-out
//! drops the cached snapshot. Unmounting cancels the
//! shell's [`Lifetime`]: pending fetches skip the network and late results are
//! dropped.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use navshell_core::event::{Event, KeyCode, KeyEvent, MouseEvent};
use navshell_core::geometry::Sides;
use navshell_render::drawing::Draw;
use navshell_render::frame::{Frame, HitGrid};
use navshell_runtime::{
    After, BusSubscription, Cmd, Every, Lifetime, Model, SharedClock, SignalBus, SubId,
    Subscription,
};
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthEvent, AuthProvider, User};
use crate::billing::{BillingError, BillingEvent, BillingService, FetchResult, SubscriptionSnapshot};
use crate::chrome::{
    self, ChromeState, HitTarget, render_desktop_sidebar, render_mobile_drawer, render_top_bar,
    render_upgrade_banner,
};
use crate::navigation::{LOGIN_ROUTE, NAVIGATION, UPGRADE_ROUTE, item_for_digit};
use crate::outlet::{Outlet, RoutePlaceholder};
use crate::payment::{
    MAX_POLLS, PAYMENT_PARAM, POLL_INTERVAL, PaymentReturn, REBROADCAST_DELAY,
};
use crate::refresh::{self, Completion, RefreshController, RefreshOutcome};
use crate::routing::Router;
use crate::theme::{self, spacing};

/// Listener on the billing bus.
pub const BUS_SUB: SubId = 1;
/// Payment-return poll.
pub const POLL_SUB: SubId = 2;
/// One-shot re-broadcast after a payment return.
pub const REBROADCAST_SUB: SubId = 3;
/// Optional auto-exit timer.
pub const EXIT_SUB: SubId = 4;
/// Listener on the auth provider's change bus.
pub const AUTH_SUB: SubId = 5;
/// Banner timers use `BANNER_SUB_BASE + epoch` so each trigger gets a fresh
/// timer and older ones are stopped.
pub const BANNER_SUB_BASE: SubId = 1 << 32;

/// How long the upgrade-success banner stays up.
pub const BANNER_DURATION: Duration = Duration::from_millis(5000);

/// Task name of a billing fetch.
pub const FETCH_TASK: &str = "billing.fetch";
/// Task name of the sign-out call.
pub const SIGN_OUT_TASK: &str = "auth.sign_out";

/// Collaborators injected into the shell.
#[derive(Clone)]
pub struct ShellDeps {
    pub router: Arc<dyn Router>,
    pub auth: Arc<dyn AuthProvider>,
    pub billing: Arc<dyn BillingService>,
    pub bus: SignalBus<BillingEvent>,
    pub clock: SharedClock,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ShellMsg {
    /// Raw terminal input.
    Event(Event),
    /// Go to a route; closes the drawer.
    Navigate(String),
    OpenSidebar,
    CloseSidebar,
    ToggleSidebar,
    CursorUp,
    CursorDown,
    /// Navigate to the entry under the keyboard cursor.
    CursorActivate,
    Refresh {
        force: bool,
    },
    /// A billing fetch issued at `issued_at` finished.
    Fetched {
        issued_at: Duration,
        result: FetchResult,
    },
    /// The bus reported a plan change.
    SubscriptionUpdated,
    /// Publish a plan change on the bus.
    PublishUpdate,
    PaymentPoll,
    Rebroadcast,
    /// The banner timer of the given epoch ran out.
    BannerExpired(u64),
    /// The auth provider reported a session change.
    AuthChanged,
    SignOut,
    SignedOut(Result<(), AuthError>),
    Quit,
}

impl From<Event> for ShellMsg {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

pub struct DashboardShell {
    deps: ShellDeps,
    outlet: Box<dyn Outlet>,
    user: Option<User>,
    refresh: RefreshController,
    payment: PaymentReturn,
    rebroadcast_pending: bool,
    sidebar_open: bool,
    show_upgrade_success: bool,
    banner_epoch: u64,
    nav_cursor: Option<usize>,
    lifetime: Lifetime,
    mounted: bool,
    last_sign_out_error: Option<AuthError>,
    exit_after: Option<Duration>,
    /// Hit regions of the last rendered frame, for mouse clicks.
    last_hits: RefCell<Option<HitGrid>>,
}

impl DashboardShell {
    pub fn new(deps: ShellDeps) -> Self {
        Self {
            deps,
            outlet: Box::new(RoutePlaceholder),
            user: None,
            refresh: RefreshController::new(),
            payment: PaymentReturn::Idle,
            rebroadcast_pending: false,
            sidebar_open: false,
            show_upgrade_success: false,
            banner_epoch: 0,
            nav_cursor: None,
            lifetime: Lifetime::new(),
            mounted: true,
            last_sign_out_error: None,
            exit_after: None,
            last_hits: RefCell::new(None),
        }
    }

    /// Replace the content outlet.
    pub fn with_outlet(mut self, outlet: impl Outlet + 'static) -> Self {
        self.outlet = Box::new(outlet);
        self
    }

    /// Quit on its own after `delay`.
    pub fn with_exit_after(mut self, delay: Duration) -> Self {
        self.exit_after = Some(delay);
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn snapshot(&self) -> Option<&SubscriptionSnapshot> {
        self.refresh.snapshot()
    }

    /// True while any billing fetch is in flight.
    pub fn loading(&self) -> bool {
        self.refresh.loading()
    }

    pub fn refresh_controller(&self) -> &RefreshController {
        &self.refresh
    }

    /// Outcome of the most recent completed fetch.
    pub fn last_refresh(&self) -> Option<&Result<(), BillingError>> {
        self.refresh.last_result()
    }

    pub fn payment(&self) -> PaymentReturn {
        self.payment
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn show_upgrade_success(&self) -> bool {
        self.show_upgrade_success
    }

    pub fn nav_cursor(&self) -> Option<usize> {
        self.nav_cursor
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn last_sign_out_error(&self) -> Option<&AuthError> {
        self.last_sign_out_error.as_ref()
    }

    pub fn current_path(&self) -> String {
        self.deps.router.path()
    }

    // -- refresh ------------------------------------------------------------

    /// Issue a refresh and, when it needs the network, the fetch task.
    fn request_refresh(&mut self, force: bool) -> Cmd<ShellMsg> {
        let now = self.deps.clock.now();
        let outcome = self
            .refresh
            .begin(self.user.as_ref(), force, now, &self.lifetime);
        debug!(force, ?outcome, "subscription refresh requested");
        if outcome != RefreshOutcome::Started {
            return Cmd::none();
        }
        let Some(user_id) = self.user.as_ref().map(|u| u.id.clone()) else {
            return Cmd::none();
        };
        let billing = Arc::clone(&self.deps.billing);
        let lifetime = self.lifetime.clone();
        Cmd::task_named(FETCH_TASK, move || ShellMsg::Fetched {
            issued_at: now,
            result: refresh::fetch(billing.as_ref(), &user_id, &lifetime),
        })
    }

    fn apply_fetch(&mut self, issued_at: Duration, result: FetchResult) {
        match self.refresh.complete(result, issued_at, &self.lifetime) {
            Completion::Stored => {
                if let Some(snap) = self.refresh.snapshot() {
                    debug!(
                        plan_type = snap.plan_type().map(|p| p.as_str()),
                        status = snap.status().map(|s| s.as_str()),
                        has_access = snap.has_access,
                        is_expired = snap.is_expired,
                        days_remaining = snap.days_remaining,
                        billing_period = %snap.billing_period_text,
                        billing_period_accurate = snap.billing_period_accurate,
                        "subscription snapshot stored"
                    );
                }
            }
            Completion::Superseded => debug!("older subscription snapshot dropped"),
            Completion::Failed => {}
            Completion::Discarded => debug!("fetch completed after unmount; ignored"),
        }
    }

    fn publish_update(&self) {
        let delivered = self.deps.bus.publish(BillingEvent::SubscriptionUpdated);
        info!(delivered, "subscription update broadcast");
    }

    // -- input --------------------------------------------------------------

    fn handle_event(&mut self, event: Event) -> Cmd<ShellMsg> {
        match event {
            Event::Key(key) if key.is_actionable() => self.handle_key(key),
            Event::Mouse(mouse) if mouse.is_left_click() => self.handle_click(mouse),
            _ => Cmd::none(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd<ShellMsg> {
        if key.ctrl() && key.is_char('c') {
            return Cmd::msg(ShellMsg::Quit);
        }
        if let Some(item) = key.digit().and_then(item_for_digit) {
            return Cmd::msg(ShellMsg::Navigate(item.href.to_owned()));
        }
        let msg = match key.code {
            KeyCode::Char('q') => ShellMsg::Quit,
            KeyCode::Char('m') => ShellMsg::ToggleSidebar,
            KeyCode::Escape => ShellMsg::CloseSidebar,
            KeyCode::Up | KeyCode::Char('k') => ShellMsg::CursorUp,
            KeyCode::Down | KeyCode::Char('j') => ShellMsg::CursorDown,
            KeyCode::Enter => ShellMsg::CursorActivate,
            KeyCode::Char('r') => ShellMsg::Refresh { force: true },
            KeyCode::Char('u') => ShellMsg::PublishUpdate,
            KeyCode::Char('s') => ShellMsg::SignOut,
            _ => return Cmd::none(),
        };
        Cmd::msg(msg)
    }

    fn handle_click(&mut self, mouse: MouseEvent) -> Cmd<ShellMsg> {
        let (x, y) = mouse.position();
        let hit = self
            .last_hits
            .borrow()
            .as_ref()
            .and_then(|grid| grid.hit_test(x, y));
        let Some(target) = hit.and_then(chrome::target_from_hit_id) else {
            return Cmd::none();
        };
        debug!(?target, x, y, "click");
        match target {
            HitTarget::Nav { index, .. } => NAVIGATION
                .get(index)
                .map_or_else(Cmd::none, |item| Cmd::msg(ShellMsg::Navigate(item.href.to_owned()))),
            HitTarget::Upgrade => Cmd::msg(ShellMsg::Navigate(UPGRADE_ROUTE.to_owned())),
            HitTarget::Menu => Cmd::msg(ShellMsg::OpenSidebar),
            HitTarget::CloseDrawer | HitTarget::Backdrop => Cmd::msg(ShellMsg::CloseSidebar),
            HitTarget::DrawerPanel
            | HitTarget::Settings
            | HitTarget::Notifications
            | HitTarget::Mail => Cmd::none(),
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let len = NAVIGATION.len();
        self.nav_cursor = Some(match (self.nav_cursor, down) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        });
    }

    fn navigate(&mut self, to: &str) {
        info!(to, "navigate");
        self.deps.router.navigate(to);
        self.sidebar_open = false;
    }

    fn chrome_state<'a>(&'a self, path: &'a str) -> ChromeState<'a> {
        ChromeState {
            current_path: path,
            user: self.user.as_ref(),
            snapshot: self.refresh.snapshot(),
            nav_cursor: self.nav_cursor,
            loading: self.refresh.loading(),
        }
    }
}

impl Model for DashboardShell {
    type Message = ShellMsg;

    fn init(&mut self) -> Cmd<ShellMsg> {
        self.user = self.deps.auth.current_user();
        info!(
            user_id = self.user.as_ref().map(|u| u.id.as_str()),
            path = %self.deps.router.path(),
            "dashboard shell mounted"
        );
        let mut cmds = vec![self.request_refresh(false)];

        let payment = self.deps.router.query_param(PAYMENT_PARAM);
        self.payment = PaymentReturn::detect(payment.as_deref());
        if self.payment == PaymentReturn::Detected {
            self.deps.router.remove_query_param(PAYMENT_PARAM);
            cmds.push(self.request_refresh(true));
            self.payment.start();
            self.rebroadcast_pending = true;
            info!(max_polls = MAX_POLLS, "payment return detected; polling subscription");
        }
        Cmd::batch(cmds)
    }

    fn update(&mut self, msg: ShellMsg) -> Cmd<ShellMsg> {
        if !self.mounted {
            if let ShellMsg::Fetched { issued_at, result } = msg {
                self.apply_fetch(issued_at, result);
            }
            return Cmd::none();
        }

        match msg {
            ShellMsg::Event(event) => return self.handle_event(event),
            ShellMsg::Navigate(to) => self.navigate(&to),
            ShellMsg::OpenSidebar => self.sidebar_open = true,
            ShellMsg::CloseSidebar => self.sidebar_open = false,
            ShellMsg::ToggleSidebar => self.sidebar_open = !self.sidebar_open,
            ShellMsg::CursorUp => self.move_cursor(false),
            ShellMsg::CursorDown => self.move_cursor(true),
            ShellMsg::CursorActivate => {
                if let Some(item) = self.nav_cursor.and_then(|i| NAVIGATION.get(i)) {
                    self.navigate(item.href);
                }
            }
            ShellMsg::Refresh { force } => return self.request_refresh(force),
            ShellMsg::Fetched { issued_at, result } => self.apply_fetch(issued_at, result),
            ShellMsg::SubscriptionUpdated => {
                self.show_upgrade_success = true;
                self.banner_epoch += 1;
                return self.request_refresh(true);
            }
            ShellMsg::PublishUpdate => self.publish_update(),
            ShellMsg::PaymentPoll => {
                if let Some(poll) = self.payment.tick() {
                    debug!(poll, max_polls = MAX_POLLS, "payment poll");
                    return self.request_refresh(true);
                }
            }
            ShellMsg::Rebroadcast => {
                self.rebroadcast_pending = false;
                self.publish_update();
            }
            ShellMsg::BannerExpired(epoch) => {
                if epoch == self.banner_epoch {
                    self.show_upgrade_success = false;
                }
            }
            ShellMsg::AuthChanged => {
                let user = self.deps.auth.current_user();
                if user == self.user {
                    return Cmd::none();
                }
                info!(user_id = user.as_ref().map(|u| u.id.as_str()), "session changed");
                self.user = user;
                return self.request_refresh(false);
            }
            ShellMsg::SignOut => {
                let auth = Arc::clone(&self.deps.auth);
                return Cmd::task_named(SIGN_OUT_TASK, move || {
                    ShellMsg::SignedOut(auth.sign_out())
                });
            }
            ShellMsg::SignedOut(result) => {
                match result {
                    Ok(()) => {
                        info!("signed out");
                        self.user = None;
                        self.last_sign_out_error = None;
                        self.refresh.forget(self.deps.clock.now());
                    }
                    Err(err) => {
                        warn!(error = %err, "sign-out failed; leaving anyway");
                        self.last_sign_out_error = Some(err);
                    }
                }
                self.navigate(LOGIN_ROUTE);
            }
            ShellMsg::Quit => return Cmd::quit(),
        }
        Cmd::none()
    }

    fn view(&self, frame: &mut Frame) {
        let area = frame.bounds();
        frame.draw_rect_filled(area, theme::page());

        let path = self.deps.router.path();
        let state = self.chrome_state(&path);
        let wide = area.width >= theme::LAYOUT_WIDE_MIN_WIDTH;

        let main = if wide {
            let (sidebar, main) = area.split_left(theme::SIDEBAR_WIDTH);
            render_desktop_sidebar(&state, frame, sidebar);
            main
        } else {
            area
        };

        let (top_bar, mut content) = main.split_top(theme::TOP_BAR_HEIGHT);
        render_top_bar(&state, frame, top_bar, !wide);
        if self.show_upgrade_success {
            let (banner, rest) = content.split_top(1);
            render_upgrade_banner(frame, banner);
            content = rest;
        }
        let content = content.inner(Sides::new(1, spacing::SM, 0, spacing::SM));
        self.outlet.render(&path, frame, content);

        if !wide && self.sidebar_open {
            render_mobile_drawer(&state, frame, area);
        }

        *self.last_hits.borrow_mut() = frame.hit_grid.clone();
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<ShellMsg>>> {
        if !self.mounted {
            return Vec::new();
        }
        let mut subs: Vec<Box<dyn Subscription<ShellMsg>>> = vec![Box::new(
            BusSubscription::new(BUS_SUB, &self.deps.bus, |event| match event {
                BillingEvent::SubscriptionUpdated => Some(ShellMsg::SubscriptionUpdated),
            }),
        )];
        subs.push(Box::new(BusSubscription::new(
            AUTH_SUB,
            &self.deps.auth.changes(),
            |event| match event {
                AuthEvent::Changed => Some(ShellMsg::AuthChanged),
            },
        )));
        if self.payment.is_polling() {
            subs.push(Box::new(Every::with_id(POLL_SUB, POLL_INTERVAL, || {
                ShellMsg::PaymentPoll
            })));
        }
        if self.rebroadcast_pending {
            subs.push(Box::new(After::with_id(
                REBROADCAST_SUB,
                REBROADCAST_DELAY,
                || ShellMsg::Rebroadcast,
            )));
        }
        if self.show_upgrade_success {
            let epoch = self.banner_epoch;
            subs.push(Box::new(After::with_id(
                BANNER_SUB_BASE + epoch,
                BANNER_DURATION,
                move || ShellMsg::BannerExpired(epoch),
            )));
        }
        if let Some(delay) = self.exit_after {
            subs.push(Box::new(After::with_id(EXIT_SUB, delay, || ShellMsg::Quit)));
        }
        subs
    }

    fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.lifetime.cancel();
        self.payment.stop();
        self.rebroadcast_pending = false;
        self.mounted = false;
        info!(in_flight = self.refresh.in_flight(), "dashboard shell unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuth;
    use crate::billing::FixedBilling;
    use crate::routing::MemoryRouter;
    use navshell_runtime::ManualClock;

    fn shell(url: &str) -> (DashboardShell, MemoryRouter) {
        let router = MemoryRouter::new(url);
        let deps = ShellDeps {
            router: Arc::new(router.clone()),
            auth: Arc::new(StaticAuth::signed_in(User::new("u-1", "owner@example.com"))),
            billing: Arc::new(FixedBilling::default()),
            bus: SignalBus::new(),
            clock: Arc::new(ManualClock::new()),
        };
        (DashboardShell::new(deps), router)
    }

    fn sub_ids(shell: &DashboardShell) -> Vec<SubId> {
        let mut ids: Vec<SubId> = shell.subscriptions().iter().map(|s| s.id()).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn plain_mount_declares_only_the_buses() {
        let (mut shell, _) = shell("/dashboard");
        let cmd = shell.init();
        assert_eq!(cmd.count(), 1);
        assert_eq!(sub_ids(&shell), vec![BUS_SUB, AUTH_SUB]);
        assert_eq!(shell.payment(), PaymentReturn::Idle);
    }

    #[test]
    fn payment_return_declares_poll_and_rebroadcast() {
        let (mut shell, router) = shell("/dashboard?payment=success");
        let cmd = shell.init();
        assert_eq!(cmd.count(), 2);
        assert_eq!(router.location(), "/dashboard");
        assert_eq!(sub_ids(&shell), vec![BUS_SUB, POLL_SUB, REBROADCAST_SUB, AUTH_SUB]);
    }

    #[test]
    fn banner_timer_is_keyed_by_epoch() {
        let (mut shell, _) = shell("/dashboard");
        let _ = shell.update(ShellMsg::SubscriptionUpdated);
        let _ = shell.update(ShellMsg::SubscriptionUpdated);
        assert!(sub_ids(&shell).contains(&(BANNER_SUB_BASE + 2)));

        let _ = shell.update(ShellMsg::BannerExpired(1));
        assert!(shell.show_upgrade_success());
        let _ = shell.update(ShellMsg::BannerExpired(2));
        assert!(!shell.show_upgrade_success());
    }

    #[test]
    fn keys_map_to_messages() {
        let (mut shell, router) = shell("/dashboard");
        let Cmd::Msg(msg) = shell.update(ShellMsg::Event(Event::key(KeyCode::Char('m')))) else {
            panic!("expected a message");
        };
        assert!(matches!(msg, ShellMsg::ToggleSidebar));

        let Cmd::Msg(ShellMsg::Navigate(to)) =
            shell.update(ShellMsg::Event(Event::key(KeyCode::Char('3'))))
        else {
            panic!("expected navigation");
        };
        assert_eq!(to, "/dashboard/rewards");
        assert_eq!(router.location(), "/dashboard");
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let (mut shell, _) = shell("/dashboard");
        let _ = shell.update(ShellMsg::CursorUp);
        assert_eq!(shell.nav_cursor(), Some(NAVIGATION.len() - 1));
        let _ = shell.update(ShellMsg::CursorDown);
        assert_eq!(shell.nav_cursor(), Some(0));
    }

    #[test]
    fn unmount_silences_subscriptions() {
        let (mut shell, _) = shell("/dashboard?payment=success");
        let _ = shell.init();
        shell.unmount();
        assert!(shell.subscriptions().is_empty());
        assert_eq!(shell.payment(), PaymentReturn::Stopped);
        assert!(shell.update(ShellMsg::Refresh { force: true }).is_none());
    }
}
