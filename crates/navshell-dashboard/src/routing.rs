#![forbid(unsafe_code)]

//! Routing collaborator.
//!
//! The shell reads the current path and query, navigates imperatively, and
//! rewrites the query in place (history replace) without a navigation.

use std::sync::{Arc, Mutex, MutexGuard};

pub trait Router: Send + Sync {
    /// Current path, without query.
    fn path(&self) -> String;

    /// First value of query parameter `key`.
    fn query_param(&self, key: &str) -> Option<String>;

    /// Navigate to `to` (`/path` or `/path?query`).
    fn navigate(&self, to: &str);

    /// Drop every `key` parameter from the current location without
    /// navigating.
    fn remove_query_param(&self, key: &str);
}

#[derive(Debug, Default)]
struct RouterState {
    path: String,
    query: Vec<(String, String)>,
    navigations: Vec<String>,
    replacements: usize,
}

/// In-memory router. Clones share the same location so a caller can keep a
/// handle while the shell owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryRouter {
    state: Arc<Mutex<RouterState>>,
}

impl MemoryRouter {
    /// A router positioned at `url` (`/path?a=1&b=2`).
    pub fn new(url: &str) -> Self {
        let (path, query) = split_url(url);
        Self {
            state: Arc::new(Mutex::new(RouterState {
                path,
                query,
                ..RouterState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current location as `path[?query]`.
    pub fn location(&self) -> String {
        let state = self.lock();
        if state.query.is_empty() {
            return state.path.clone();
        }
        let query: Vec<String> = state
            .query
            .iter()
            .map(|(k, v)| if v.is_empty() { k.clone() } else { format!("{k}={v}") })
            .collect();
        format!("{}?{}", state.path, query.join("&"))
    }

    /// Every `navigate` target, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// How many in-place query rewrites happened.
    pub fn replacements(&self) -> usize {
        self.lock().replacements
    }
}

impl Router for MemoryRouter {
    fn path(&self) -> String {
        self.lock().path.clone()
    }

    fn query_param(&self, key: &str) -> Option<String> {
        self.lock()
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn navigate(&self, to: &str) {
        let (path, query) = split_url(to);
        let mut state = self.lock();
        state.path = path;
        state.query = query;
        state.navigations.push(to.to_owned());
    }

    fn remove_query_param(&self, key: &str) {
        let mut state = self.lock();
        state.query.retain(|(k, _)| k != key);
        state.replacements += 1;
    }
}

fn split_url(url: &str) -> (String, Vec<(String, String)>) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let path = if path.is_empty() { "/" } else { path };
    let query = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k.to_owned(), v.to_owned())
        })
        .collect();
    (path.to_owned(), query)
}
