#![forbid(unsafe_code)]

//! Cancellation token tied to a model's mounted lifetime.
//!
//! Background work captures a clone of the token. Once the owner cancels it
//! (typically on unmount), the work should skip side effects and the owner
//! should discard any completion it still receives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Lifetime {
    cancelled: Arc<AtomicBool>,
}

impl Lifetime {
    /// A live (not cancelled) token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_live() {
        assert!(!Lifetime::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = Lifetime::new();
        let captured = token.clone();
        token.cancel();
        assert!(captured.is_cancelled());
    }

    #[test]
    fn distinct_tokens_are_independent() {
        let a = Lifetime::new();
        let b = Lifetime::new();
        a.cancel();
        assert!(!b.is_cancelled());
        assert!(a.is_cancelled());
    }
}
