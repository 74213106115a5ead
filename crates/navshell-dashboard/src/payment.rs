#![forbid(unsafe_code)]

//! Payment-return flow.
//!
//! `Idle → Detected → Polling(0..=MAX_POLLS) → Stopped`. Entered only when the
//! location carries `payment=success` at mount; leaves `Polling` after
//! [`MAX_POLLS`] ticks or on unmount. There is no way back from `Stopped`.

use std::time::Duration;

/// Query parameter inspected at mount.
pub const PAYMENT_PARAM: &str = "payment";
/// Value of [`PAYMENT_PARAM`] that starts the flow.
pub const PAYMENT_SUCCESS: &str = "success";
/// Spacing of forced refreshes while polling.
pub const POLL_INTERVAL: Duration = Duration::from_millis(6000);
/// Forced refreshes issued by the poll, not counting the initial one.
pub const MAX_POLLS: u32 = 20;
/// Delay before the update signal is re-broadcast.
pub const REBROADCAST_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentReturn {
    #[default]
    Idle,
    Detected,
    Polling {
        count: u32,
    },
    Stopped,
}

impl PaymentReturn {
    /// Initial state for a `payment` query value.
    pub fn detect(payment: Option<&str>) -> Self {
        if payment == Some(PAYMENT_SUCCESS) {
            Self::Detected
        } else {
            Self::Idle
        }
    }

    /// `Detected → Polling(0)`. Returns whether polling started.
    pub fn start(&mut self) -> bool {
        if *self == Self::Detected {
            *self = Self::Polling { count: 0 };
            true
        } else {
            false
        }
    }

    /// Record one poll tick and return its 1-based number.
    ///
    /// The tick that reaches [`MAX_POLLS`] moves to `Stopped`. Outside
    /// `Polling` nothing happens.
    pub fn tick(&mut self) -> Option<u32> {
        let Self::Polling { count } = *self else {
            return None;
        };
        let n = count + 1;
        *self = if n >= MAX_POLLS {
            Self::Stopped
        } else {
            Self::Polling { count: n }
        };
        Some(n)
    }

    /// Stop for good, e.g. on unmount. Idle stays idle.
    pub fn stop(&mut self) {
        if *self != Self::Idle {
            *self = Self::Stopped;
        }
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, Self::Polling { .. })
    }
}
