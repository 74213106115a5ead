#![forbid(unsafe_code)]

//! Static navigation model and the active-route predicate.

/// Root of the authenticated area.
pub const DASHBOARD_ROUTE: &str = "/dashboard";
/// Where sign-out lands.
pub const LOGIN_ROUTE: &str = "/login";
/// Target of the upgrade call-to-action.
pub const UPGRADE_ROUTE: &str = "/upgrade";

/// Symbolic icon for a navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Home,
    ChefHat,
    Gift,
    Users,
    MapPin,
    Settings,
    CreditCard,
    BarChart,
    Headphones,
}

impl Icon {
    /// Single-column glyph drawn in front of the label.
    pub const fn glyph(self) -> char {
        match self {
            Self::Home => '⌂',
            Self::ChefHat => '♨',
            Self::Gift => '✿',
            Self::Users => '☺',
            Self::MapPin => '⚑',
            Self::Settings => '⚙',
            Self::CreditCard => '▭',
            Self::BarChart => '▥',
            Self::Headphones => '☊',
        }
    }
}

/// One entry of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub icon: Icon,
}

/// Sidebar entries in display order.
pub const NAVIGATION: [NavItem; 9] = [
    NavItem {
        label: "Dashboard",
        href: DASHBOARD_ROUTE,
        icon: Icon::Home,
    },
    NavItem {
        label: "Menu Items",
        href: "/dashboard/menu-items",
        icon: Icon::ChefHat,
    },
    NavItem {
        label: "Rewards",
        href: "/dashboard/rewards",
        icon: Icon::Gift,
    },
    NavItem {
        label: "Customers",
        href: "/customers",
        icon: Icon::Users,
    },
    NavItem {
        label: "Branches",
        href: "/dashboard/branches",
        icon: Icon::MapPin,
    },
    NavItem {
        label: "Loyalty Config",
        href: "/dashboard/loyalty-config",
        icon: Icon::Settings,
    },
    NavItem {
        label: "Billing",
        href: "/dashboard/billing",
        icon: Icon::CreditCard,
    },
    NavItem {
        label: "Analytics",
        href: "/analytics",
        icon: Icon::BarChart,
    },
    NavItem {
        label: "Support",
        href: "/dashboard/support",
        icon: Icon::Headphones,
    },
];

/// Whether the entry for `href` is highlighted at `current_path`.
///
/// Literal equality only. In particular the dashboard root is not active on
/// its nested routes, and no entry is active on a sub-path of its route.
#[inline]
pub fn is_active(current_path: &str, href: &str) -> bool {
    current_path == href
}

/// Index of the highlighted entry, if any.
pub fn active_index(current_path: &str) -> Option<usize> {
    NAVIGATION
        .iter()
        .position(|item| is_active(current_path, item.href))
}

/// The entry bound to digit key `n` (1-based).
pub fn item_for_digit(n: u8) -> Option<&'static NavItem> {
    (n as usize).checked_sub(1).and_then(|i| NAVIGATION.get(i))
}

/// The entry whose route is exactly `path`.
pub fn item_for_path(path: &str) -> Option<&'static NavItem> {
    NAVIGATION.iter().find(|item| item.href == path)
}
