#![forbid(unsafe_code)]

//! Auth collaborator: the signed-in user and sign-out.
//!
//! Providers announce session changes on a [`SignalBus`]; the shell listens
//! there and re-reads [`AuthProvider::current_user`] when one arrives.

use std::fmt;
use std::sync::Mutex;

use navshell_runtime::SignalBus;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
        }
    }

    /// First character of the email, uppercased.
    pub fn initial(&self) -> Option<char> {
        self.email
            .as_deref()
            .and_then(|e| e.chars().next())
            .and_then(|c| c.to_uppercase().next())
    }

    /// Local part of the email, or `"User"` when there is none.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
    }

    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Sign-out was requested with nobody signed in.
    NotSignedIn,
    /// The provider refused the request.
    Rejected(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSignedIn => write!(f, "no user is signed in"),
            Self::Rejected(why) => write!(f, "sign-out rejected: {why}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Published whenever the signed-in user changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    Changed,
}

/// Session owner. `sign_out` is called from a background task.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;
    fn sign_out(&self) -> Result<(), AuthError>;
    /// Bus carrying [`AuthEvent::Changed`] after every session change.
    fn changes(&self) -> SignalBus<AuthEvent>;
}

/// In-process session: a fixed user that can be signed in and out.
#[derive(Debug, Default)]
pub struct StaticAuth {
    user: Mutex<Option<User>>,
    reject_sign_out: Option<String>,
    changes: SignalBus<AuthEvent>,
}

impl StaticAuth {
    pub fn signed_in(user: User) -> Self {
        Self {
            user: Mutex::new(Some(user)),
            ..Self::default()
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Make every sign-out fail with `reason`; the session stays intact.
    pub fn rejecting_sign_out(mut self, reason: impl Into<String>) -> Self {
        self.reject_sign_out = Some(reason.into());
        self
    }

    /// Replace the session user and announce the change.
    pub fn sign_in(&self, user: User) {
        *self.user.lock().unwrap_or_else(|e| e.into_inner()) = Some(user);
        self.changes.publish(AuthEvent::Changed);
    }
}

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<User> {
        self.user.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(reason) = &self.reject_sign_out {
            return Err(AuthError::Rejected(reason.clone()));
        }
        let previous = self.user.lock().unwrap_or_else(|e| e.into_inner()).take();
        if previous.is_none() {
            return Err(AuthError::NotSignedIn);
        }
        self.changes.publish(AuthEvent::Changed);
        Ok(())
    }

    fn changes(&self) -> SignalBus<AuthEvent> {
        self.changes.clone()
    }
}
