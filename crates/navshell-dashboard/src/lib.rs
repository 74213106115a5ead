#![forbid(unsafe_code)]

//! Dashboard navigation shell with a polled subscription cache.
//!
//! The shell is an Elm-style [`navshell_runtime::Model`]
//! ([`app::DashboardShell`]) that draws a sidebar or drawer of navigation
//! entries, a top bar, and a content outlet, and keeps the signed-in user's
//! subscription snapshot fresh. Collaborators (router, auth, billing, the
//! signal bus, the clock) are injected through [`app::ShellDeps`].

pub mod app;
pub mod auth;
pub mod billing;
pub mod cache;
pub mod chrome;
pub mod cli;
pub mod navigation;
pub mod outlet;
pub mod payment;
pub mod refresh;
pub mod routing;
pub mod theme;
