#![forbid(unsafe_code)]

//! Shell chrome: desktop sidebar, mobile drawer, top bar, and the
//! upgrade-success banner.
//!
//! Every clickable element registers a hit region; [`target_from_hit_id`]
//! maps a hit back to what was clicked.

use navshell_core::geometry::{Rect, Sides};
use navshell_render::cell::{Cell, StyleFlags};
use navshell_render::drawing::{BorderChars, Draw};
use navshell_render::frame::{Frame, HitId};
use navshell_render::truncate_to_width;
use unicode_width::UnicodeWidthStr;

use crate::auth::User;
use crate::billing::{SubscriptionSnapshot, should_show_upgrade};
use crate::navigation::{NAVIGATION, is_active};
use crate::theme::{self, spacing};

// ---------------------------------------------------------------------------
// Hit IDs
// ---------------------------------------------------------------------------

/// Base hit ID for desktop sidebar entries. Entry i has HitId(NAV_HIT_BASE + i).
pub const NAV_HIT_BASE: u32 = 1000;
/// Base hit ID for drawer entries.
pub const DRAWER_NAV_HIT_BASE: u32 = 2000;
pub const UPGRADE_HIT: u32 = 3000;
pub const MENU_HIT: u32 = 3001;
pub const DRAWER_CLOSE_HIT: u32 = 3002;
pub const BACKDROP_HIT: u32 = 3003;
/// Blank drawer surface; swallows clicks so they don't reach the page below.
pub const DRAWER_PANEL_HIT: u32 = 3004;
pub const SETTINGS_HIT: u32 = 3005;
pub const NOTIFICATIONS_HIT: u32 = 3006;
pub const MAIL_HIT: u32 = 3007;

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Nav { index: usize, in_drawer: bool },
    Upgrade,
    Menu,
    CloseDrawer,
    Backdrop,
    DrawerPanel,
    Settings,
    Notifications,
    Mail,
}

/// Convert a hit ID back to its target.
pub fn target_from_hit_id(id: HitId) -> Option<HitTarget> {
    let raw = id.id();
    let count = NAVIGATION.len() as u32;
    if (NAV_HIT_BASE..NAV_HIT_BASE + count).contains(&raw) {
        return Some(HitTarget::Nav {
            index: (raw - NAV_HIT_BASE) as usize,
            in_drawer: false,
        });
    }
    if (DRAWER_NAV_HIT_BASE..DRAWER_NAV_HIT_BASE + count).contains(&raw) {
        return Some(HitTarget::Nav {
            index: (raw - DRAWER_NAV_HIT_BASE) as usize,
            in_drawer: true,
        });
    }
    match raw {
        UPGRADE_HIT => Some(HitTarget::Upgrade),
        MENU_HIT => Some(HitTarget::Menu),
        DRAWER_CLOSE_HIT => Some(HitTarget::CloseDrawer),
        BACKDROP_HIT => Some(HitTarget::Backdrop),
        DRAWER_PANEL_HIT => Some(HitTarget::DrawerPanel),
        SETTINGS_HIT => Some(HitTarget::Settings),
        NOTIFICATIONS_HIT => Some(HitTarget::Notifications),
        MAIL_HIT => Some(HitTarget::Mail),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Render state
// ---------------------------------------------------------------------------

/// Everything the chrome reads. Purely derived from shell state.
#[derive(Debug, Clone, Copy)]
pub struct ChromeState<'a> {
    pub current_path: &'a str,
    pub user: Option<&'a User>,
    pub snapshot: Option<&'a SubscriptionSnapshot>,
    /// Keyboard cursor over the navigation entries.
    pub nav_cursor: Option<usize>,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Desktop,
    Drawer,
}

impl Variant {
    fn nav_hit_base(self) -> u32 {
        match self {
            Self::Desktop => NAV_HIT_BASE,
            Self::Drawer => DRAWER_NAV_HIT_BASE,
        }
    }

    fn upgrade_caption(self) -> &'static str {
        match self {
            Self::Desktop => "Unlock all features",
            Self::Drawer => "Complete to unlock features",
        }
    }
}

const BRAND: &str = "Leyls";
const UPGRADE_CARD_HEIGHT: u16 = 5;
const FOOTER_HEIGHT: u16 = 3;
const NAV_TOP: u16 = 3;

// ---------------------------------------------------------------------------
// Sidebars
// ---------------------------------------------------------------------------

/// Render the fixed desktop sidebar into `area`.
pub fn render_desktop_sidebar(state: &ChromeState<'_>, frame: &mut Frame, area: Rect) {
    render_sidebar(state, frame, area, Variant::Desktop);
}

/// Render the mobile drawer over `area` (the whole screen): dim the page,
/// make the uncovered part a close-on-click backdrop, then draw the panel.
pub fn render_mobile_drawer(state: &ChromeState<'_>, frame: &mut Frame, area: Rect) {
    frame
        .buffer
        .dim_area(area, theme::BACKDROP_DIM, theme::palette::PAGE_BG);
    let (panel, backdrop) = area.split_left(theme::DRAWER_WIDTH);
    frame.register_hit_region(backdrop, HitId::new(BACKDROP_HIT));
    frame.register_hit_region(panel, HitId::new(DRAWER_PANEL_HIT));
    render_sidebar(state, frame, panel, Variant::Drawer);
}

fn render_sidebar(state: &ChromeState<'_>, frame: &mut Frame, area: Rect, variant: Variant) {
    if area.is_empty() {
        return;
    }
    frame.buffer.push_scissor(area);
    frame.draw_rect_filled(area, theme::sidebar());
    let inner = area.inner(Sides::horizontal(spacing::SM));

    render_brand(frame, inner, area, variant);

    for (i, item) in NAVIGATION.iter().enumerate() {
        let Some(row) = inner.row(NAV_TOP + i as u16) else {
            break;
        };
        let active = is_active(state.current_path, item.href);
        let style = theme::nav_item(active);
        if active {
            frame.draw_rect_filled(row, theme::card());
        }
        if state.nav_cursor == Some(i) {
            frame.buffer.set(row.x, row.y, theme::nav_cursor());
        }
        let label = format!("{}  {}", item.icon.glyph(), item.label);
        frame.print_text_clipped(row.x + spacing::SM, row.y, &label, style, row.right());
        frame.register_hit_region(row, HitId::new(variant.nav_hit_base() + i as u32));
    }

    // Bottom-up: padding row, user footer, optional upgrade card.
    let mut bottom = area.bottom().saturating_sub(1);
    bottom = bottom.saturating_sub(FOOTER_HEIGHT);
    render_user_footer(state.user, frame, Rect::new(inner.x, bottom, inner.width, FOOTER_HEIGHT));

    if should_show_upgrade(state.snapshot) {
        bottom = bottom.saturating_sub(UPGRADE_CARD_HEIGHT + 1);
        let card = Rect::new(inner.x, bottom, inner.width, UPGRADE_CARD_HEIGHT);
        render_upgrade_card(frame, card, variant);
    }

    frame.buffer.pop_scissor();
}

fn render_brand(frame: &mut Frame, inner: Rect, area: Rect, variant: Variant) {
    let Some(row) = inner.row(1) else {
        return;
    };
    match variant {
        Variant::Desktop => {
            frame.print_text(row.x, row.y, " ◆ ", theme::accent_badge());
            frame.print_text_clipped(
                row.x + 4,
                row.y,
                BRAND,
                theme::sidebar_text().with_attrs(StyleFlags::BOLD),
                row.right(),
            );
        }
        Variant::Drawer => {
            frame.print_text_clipped(row.x, row.y, BRAND, theme::sidebar_text(), row.right());
            let close_x = area.right().saturating_sub(spacing::SM + 1);
            frame.print_text(close_x, row.y, "✕", theme::sidebar_muted());
            let hit = Rect::new(close_x.saturating_sub(1), row.y.saturating_sub(1), 3, 3);
            frame.register_hit_region(hit, HitId::new(DRAWER_CLOSE_HIT));
        }
    }
}

fn render_upgrade_card(frame: &mut Frame, card: Rect, variant: Variant) {
    frame.draw_rect_filled(card, theme::card());
    let inner = card.inner(Sides::horizontal(spacing::XS));
    let max_x = inner.right();

    if let Some(row) = inner.row(1) {
        let x = frame.print_text(row.x, row.y, "40%", theme::accent_badge());
        frame.print_text_clipped(
            x + spacing::XS,
            row.y,
            "Complete profile",
            theme::sidebar_text().with_attrs(StyleFlags::BOLD),
            max_x,
        );
    }
    if let Some(row) = inner.row(2) {
        frame.print_text_clipped(
            row.x + 4,
            row.y,
            variant.upgrade_caption(),
            theme::sidebar_muted(),
            max_x,
        );
    }
    if let Some(row) = inner.row(3) {
        frame.draw_rect_filled(row, theme::upgrade_button());
        let label = "Upgrade Now";
        let pad = row.width.saturating_sub(label.width() as u16) / 2;
        frame.print_text_clipped(row.x + pad, row.y, label, theme::upgrade_button(), max_x);
        frame.register_hit_region(row, HitId::new(UPGRADE_HIT));
    }
}

fn render_user_footer(user: Option<&User>, frame: &mut Frame, area: Rect) {
    if let Some(rule) = area.row(0) {
        frame.draw_horizontal_line(rule.x, rule.y, rule.width, theme::sidebar_rule());
    }
    let initial = user.and_then(User::initial).unwrap_or(' ');
    let name = user.map_or("User", User::display_name);
    let email = user.map(User::email).unwrap_or_default();
    let text_width = area.width.saturating_sub(6) as usize;

    if let Some(row) = area.row(1) {
        frame.print_text(row.x, row.y, &format!(" {initial} "), theme::accent_badge());
        frame.print_text_clipped(
            row.x + 4,
            row.y,
            &truncate_to_width(name, text_width),
            theme::sidebar_text(),
            row.right().saturating_sub(2),
        );
        let gear_x = row.right().saturating_sub(1);
        frame.print_text(gear_x, row.y, "⚙", theme::sidebar_muted());
        frame.register_hit_region(Rect::new(gear_x, row.y, 1, 1), HitId::new(SETTINGS_HIT));
    }
    if let Some(row) = area.row(2) {
        frame.print_text_clipped(
            row.x + 4,
            row.y,
            &truncate_to_width(email, text_width),
            theme::sidebar_muted(),
            row.right(),
        );
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top bar. `show_menu` adds the drawer button (narrow layouts).
pub fn render_top_bar(state: &ChromeState<'_>, frame: &mut Frame, area: Rect, show_menu: bool) {
    if area.is_empty() {
        return;
    }
    frame.draw_rect_filled(area, theme::page());
    let mid = area.y + area.height / 2;
    let mut left = area.x + spacing::SM;

    if show_menu {
        frame.print_text(left, mid, "≡", theme::page_text());
        let hit = Rect::new(left.saturating_sub(1), area.y, 3, area.height);
        frame.register_hit_region(hit, HitId::new(MENU_HIT));
        left += 4;
    }

    // Right cluster, laid out right to left.
    let mut right = area.right().saturating_sub(spacing::SM);
    for (glyph, hit_id, dot) in [("✉", MAIL_HIT, false), ("⍾", NOTIFICATIONS_HIT, true)] {
        if right < left + 4 {
            break;
        }
        let x = right - 2;
        frame.print_text(x, mid, glyph, theme::page_text());
        if dot {
            frame.buffer.set(x + 1, mid.saturating_sub(1), theme::unread_dot());
        }
        frame.register_hit_region(Rect::new(x - 1, area.y, 3, area.height), HitId::new(hit_id));
        right -= 4;
    }

    let status = status_text(state);
    if !status.is_empty() {
        let w = status.width() as u16;
        if right > left + w + 16 {
            frame.print_text(right - w, mid, &status, theme::page_muted());
            right -= w + spacing::SM;
        }
    }

    let search_width = right.saturating_sub(left).min(theme::SEARCH_MAX_WIDTH);
    if search_width >= 12 && area.height >= 3 {
        render_search(frame, Rect::new(left, area.y, search_width, 3));
    }
}

/// Loading indicator and trial countdown for the top bar.
fn status_text(state: &ChromeState<'_>) -> String {
    let mut parts = Vec::new();
    if state.loading {
        parts.push("↻ syncing".to_owned());
    }
    if let Some(days) = state.snapshot.and_then(SubscriptionSnapshot::trial_days) {
        let unit = if days == 1 { "day" } else { "days" };
        parts.push(format!("Trial · {days} {unit} left"));
    }
    parts.join("  ")
}

fn render_search(frame: &mut Frame, rect: Rect) {
    frame.draw_box(rect, BorderChars::ROUNDED, theme::panel_border(), theme::panel());
    let inner = rect.inner(Sides::all(1));
    let Some(row) = inner.row(0) else {
        return;
    };
    let hint = "⌘ F";
    let hint_x = row.right().saturating_sub(hint.width() as u16 + 1);
    let x = frame.print_text_clipped(row.x + 1, row.y, "⌕ ", theme::page_muted(), hint_x);
    frame.print_text_clipped(
        x,
        row.y,
        "Search anything...",
        Cell::default().with_fg(theme::palette::PLACEHOLDER),
        hint_x.saturating_sub(1),
    );
    frame.print_text_clipped(hint_x, row.y, hint, theme::kbd(), row.right());
}

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

pub const BANNER_TEXT: &str = "✓ Subscription updated successfully! Your plan changes are now active.";

/// Full-width success strip across the top of the content area.
pub fn render_upgrade_banner(frame: &mut Frame, area: Rect) {
    if area.is_empty() {
        return;
    }
    frame.draw_rect_filled(area, theme::success_banner());
    let text = truncate_to_width(BANNER_TEXT, area.width.saturating_sub(2) as usize);
    frame.print_text_clipped(area.x + 1, area.y, &text, theme::success_banner(), area.right());
}
