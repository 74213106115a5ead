//! Rendered shell: responsive layout, drawer behaviour, mouse and keyboard
//! navigation, and the upgrade call to action.

mod common;

use common::{CountingBilling, Fixture, build, mount, owner};
use navshell_core::event::{Event, KeyCode, KeyEvent, Modifiers};
use navshell_dashboard::app::ShellMsg;
use navshell_dashboard::auth::StaticAuth;
use navshell_dashboard::billing::{PlanType, SubscriptionSnapshot};
use navshell_dashboard::navigation::UPGRADE_ROUTE;
use navshell_harness::{assert_buffer_contains, assert_buffer_lacks, count_rows_with, find_text};
use navshell_runtime::SignalBus;

const WIDE: (u16, u16) = (120, 36);
const NARROW: (u16, u16) = (80, 30);

fn key(c: char) -> Event {
    Event::key(KeyCode::Char(c))
}

fn click_on(fx: &mut Fixture, size: (u16, u16), label: &str) {
    let buf = fx.sim.capture_frame(size.0, size.1).clone();
    let Some((x, y)) = find_text(&buf, label) else {
        panic!("{label:?} not on screen:\n{}", navshell_harness::buffer_to_text(&buf));
    };
    fx.sim.inject_event(Event::click(x, y));
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[test]
fn wide_layout_shows_fixed_sidebar() {
    let mut fx = mount("/dashboard", 5);
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, "Leyls");
    assert_buffer_contains!(buf, "Loyalty Config");
    assert_buffer_contains!(buf, "Search anything...");
    assert_buffer_lacks!(buf, "≡");
    assert_buffer_lacks!(buf, "✕");
}

#[test]
fn wide_layout_never_draws_the_drawer() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.inject_event(key('m'));
    assert!(fx.shell().sidebar_open());
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_lacks!(buf, "✕");
    assert_eq!(count_rows_with(&buf, "Loyalty Config"), 1);
}

#[test]
fn narrow_layout_hides_navigation_until_opened() {
    let mut fx = mount("/dashboard", 5);
    let buf = fx.sim.capture_frame(NARROW.0, NARROW.1).clone();
    assert_buffer_contains!(buf, "≡");
    assert_buffer_lacks!(buf, "Loyalty Config");

    click_on(&mut fx, NARROW, "≡");
    assert!(fx.shell().sidebar_open());
    let buf = fx.sim.capture_frame(NARROW.0, NARROW.1).clone();
    assert_buffer_contains!(buf, "Loyalty Config");
    assert_buffer_contains!(buf, "✕");
}

#[test]
fn drawer_click_navigates_and_closes() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.send(ShellMsg::OpenSidebar);
    click_on(&mut fx, NARROW, "Rewards");

    assert!(!fx.shell().sidebar_open());
    assert_eq!(fx.router.location(), "/dashboard/rewards");
    let buf = fx.sim.capture_frame(NARROW.0, NARROW.1).clone();
    assert_buffer_lacks!(buf, "Loyalty Config");
}

#[test]
fn backdrop_and_close_button_close_the_drawer() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.send(ShellMsg::OpenSidebar);
    let _ = fx.sim.capture_frame(NARROW.0, NARROW.1);
    fx.sim.inject_event(Event::click(NARROW.0 - 5, NARROW.1 / 2));
    assert!(!fx.shell().sidebar_open());
    assert_eq!(fx.router.location(), "/dashboard");

    fx.sim.send(ShellMsg::OpenSidebar);
    click_on(&mut fx, NARROW, "✕");
    assert!(!fx.shell().sidebar_open());
}

#[test]
fn escape_closes_and_m_toggles() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.inject_event(key('m'));
    assert!(fx.shell().sidebar_open());
    fx.sim.inject_event(Event::key(KeyCode::Escape));
    assert!(!fx.shell().sidebar_open());
    fx.sim.inject_event(key('m'));
    fx.sim.inject_event(key('m'));
    assert!(!fx.shell().sidebar_open());
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[test]
fn sidebar_click_navigates() {
    let mut fx = mount("/dashboard", 5);
    click_on(&mut fx, WIDE, "Billing");
    assert_eq!(fx.router.location(), "/dashboard/billing");
    assert_eq!(fx.router.navigations(), vec!["/dashboard/billing".to_string()]);

    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, "/dashboard/billing");
}

#[test]
fn digit_keys_jump_to_entries() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.inject_event(key('8'));
    assert_eq!(fx.router.location(), "/analytics");
    fx.sim.inject_event(key('0'));
    assert_eq!(fx.router.location(), "/analytics");
}

#[test]
fn cursor_and_enter_navigate() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.inject_event(Event::key(KeyCode::Down));
    fx.sim.inject_event(key('j'));
    assert_eq!(fx.shell().nav_cursor(), Some(1));
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, "▸");

    fx.sim.inject_event(Event::key(KeyCode::Enter));
    assert_eq!(fx.router.location(), "/dashboard/menu-items");
}

#[test]
fn released_keys_are_ignored() {
    use navshell_core::event::KeyEventKind;

    let mut fx = mount("/dashboard", 5);
    let release = KeyEvent::new(KeyCode::Char('m')).with_kind(KeyEventKind::Release);
    fx.sim.inject_event(Event::Key(release));
    assert!(!fx.shell().sidebar_open());
}

#[test]
fn quit_keys_stop_the_program() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.inject_event(key('q'));
    assert!(!fx.sim.is_running());

    let mut fx = mount("/dashboard", 5);
    let ctrl_c = KeyEvent::new(KeyCode::Char('c')).with_modifiers(Modifiers::CTRL);
    fx.sim.inject_event(Event::Key(ctrl_c));
    assert!(!fx.sim.is_running());
}

// ---------------------------------------------------------------------------
// Upgrade call to action and chrome content
// ---------------------------------------------------------------------------

#[test]
fn short_trial_shows_upgrade_card() {
    let mut fx = mount("/dashboard", 3);
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, "Upgrade Now");
    assert_buffer_contains!(buf, "Unlock all features");
    assert_buffer_contains!(buf, "Trial · 3 days left");

    click_on(&mut fx, WIDE, "Upgrade Now");
    assert_eq!(fx.router.location(), UPGRADE_ROUTE);
}

#[test]
fn long_trial_and_paid_plans_hide_upgrade_card() {
    let mut fx = mount("/dashboard", 8);
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_lacks!(buf, "Upgrade Now");

    let mut fx = build(
        "/dashboard",
        StaticAuth::signed_in(owner()),
        CountingBilling::new(SubscriptionSnapshot::paid(PlanType::Monthly)),
        SignalBus::new(),
    );
    fx.sim.init();
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_lacks!(buf, "Upgrade Now");
    assert_buffer_lacks!(buf, "Trial");
}

#[test]
fn drawer_upgrade_card_uses_drawer_caption() {
    let mut fx = mount("/dashboard", 0);
    fx.sim.send(ShellMsg::OpenSidebar);
    let buf = fx.sim.capture_frame(NARROW.0, NARROW.1).clone();
    assert_buffer_contains!(buf, "Complete to unlock features");

    click_on(&mut fx, NARROW, "Upgrade Now");
    assert_eq!(fx.router.location(), UPGRADE_ROUTE);
    assert!(!fx.shell().sidebar_open());
}

#[test]
fn user_footer_shows_identity() {
    let mut fx = mount("/dashboard", 5);
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, " O ");
    assert_buffer_contains!(buf, "owner@example.com");
}

#[test]
fn signed_out_footer_falls_back() {
    let mut fx = build(
        "/dashboard",
        StaticAuth::signed_out(),
        CountingBilling::new(SubscriptionSnapshot::trial(5)),
        SignalBus::new(),
    );
    fx.sim.init();
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, "User");
    assert_buffer_lacks!(buf, "Trial");
}

#[test]
fn banner_renders_while_visible() {
    let mut fx = mount("/dashboard", 5);
    fx.sim.send(ShellMsg::SubscriptionUpdated);
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, "Subscription updated successfully!");

    fx.sim.advance_time(navshell_dashboard::app::BANNER_DURATION);
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_lacks!(buf, "Subscription updated successfully!");
}

#[test]
fn loading_indicator_while_fetching() {
    let mut fx = build(
        "/dashboard",
        StaticAuth::signed_in(owner()),
        CountingBilling::new(SubscriptionSnapshot::trial(5)),
        SignalBus::new(),
    );
    fx.sim.defer_tasks(true);
    fx.sim.init();
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_contains!(buf, "syncing");

    fx.sim.run_pending_tasks();
    let buf = fx.sim.capture_frame(WIDE.0, WIDE.1).clone();
    assert_buffer_lacks!(buf, "syncing");
}
