/*
[INPUT]:  Route changes requested by auth flows and the HTTP layer
[OUTPUT]: Current location, change notifications, guarded route resolution
[POS]:    App layer - routing state shared across components
[UPDATE]: When routes or guard rules change
*/

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::store::AuthSnapshot;
use crate::types::UserRole;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";
pub const TECHNICIAN_HOME_ROUTE: &str = "/technician";

/// Shared "browser location".
///
/// Cloning yields another handle to the same location.
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: Arc<watch::Sender<String>>,
}

impl Navigator {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self { tx: Arc::new(tx) }
    }

    pub fn navigate(&self, path: &str) {
        debug!(to = path, "navigate");
        self.tx.send_replace(path.to_string());
    }

    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    pub fn is_at(&self, path: &str) -> bool {
        *self.tx.borrow() == path
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(HOME_ROUTE)
    }
}

/// Resolve the route actually shown for `path`.
///
/// Everything except `/login` requires authentication; the index route
/// sends technicians to their own dashboard.
pub fn resolve_route(path: &str, auth: &AuthSnapshot) -> String {
    if path == LOGIN_ROUTE {
        return path.to_string();
    }
    if !auth.is_authenticated {
        return LOGIN_ROUTE.to_string();
    }
    if path == HOME_ROUTE && auth.role() == Some(UserRole::Technician) {
        return TECHNICIAN_HOME_ROUTE.to_string();
    }
    path.to_string()
}
