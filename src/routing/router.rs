//! Navigation with the two gates applied on every move.
//!
//! The router never caches a decision: each `navigate` reads the latest
//! session snapshot and evaluates the route again.

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::routes::{normalize_path, resolve, Access, Page, Resolved, DASHBOARD_PATH, LOGIN_PATH, ROOT_PATH};
use crate::identity::{check_access, RoleSet, Session, SessionStore};

const MAX_REDIRECTS: usize = 8;
/// Locations remembered for `back`; the oldest are forgotten first.
pub const MAX_HISTORY: usize = 50;

/// Shown in place of a page when the user's role is not allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub path: String,
    pub required: RoleSet,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "You don't have permission to access this page. Required roles: {}", self.required)
    }
}

/// One step of gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Page),
    /// `from` is the location the user asked for, kept for the post-login return.
    Redirect { to: String, from: Option<String> },
    Denied(AccessDenied),
}

/// Requires a signed-in user; otherwise redirects to login remembering `target`.
pub fn require_authenticated(session: &Session, target: &str) -> Option<Navigation> {
    if session.user.is_some() {
        None
    } else {
        Some(Navigation::Redirect { to: LOGIN_PATH.to_string(), from: Some(target.to_string()) })
    }
}

/// Requires a user whose role is in `allowed`. A mismatch is an in-place denial, not a redirect.
pub fn require_roles(session: &Session, allowed: &RoleSet, target: &str) -> Option<Navigation> {
    if let Some(redirect) = require_authenticated(session, target) {
        return Some(redirect);
    }
    if check_access(session, allowed) {
        None
    } else {
        Some(Navigation::Denied(AccessDenied { path: target.to_string(), required: allowed.clone() }))
    }
}

/// Evaluate `path` against `session` without following redirects.
pub fn evaluate(session: &Session, path: &str) -> Navigation {
    let path = normalize_path(path);
    match resolve(&path) {
        Resolved::Redirect(to) => Navigation::Redirect { to: to.to_string(), from: None },
        Resolved::Route { page, access } => match access {
            Access::Public => Navigation::Render(page),
            Access::Guest if session.is_authenticated => {
                Navigation::Redirect { to: DASHBOARD_PATH.to_string(), from: None }
            }
            Access::Guest => Navigation::Render(page),
            Access::Dashboard(roles) => require_roles(session, &roles, &path).unwrap_or(Navigation::Render(page)),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    /// Where a login redirect came from.
    pub from: Option<String>,
}

impl Location {
    fn root() -> Self { Self { path: ROOT_PATH.to_string(), from: None } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Page(Page),
    Denied(AccessDenied),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub location: Location,
    pub view: View,
}

struct RouterState {
    current: Screen,
    history: VecDeque<Location>,
}

pub struct Router {
    store: Arc<SessionStore>,
    inner: Mutex<RouterState>,
}

impl Router {
    pub fn new(store: Arc<SessionStore>) -> Self {
        let current = Screen { location: Location::root(), view: View::Page(Page::Home) };
        Self { store, inner: Mutex::new(RouterState { current, history: VecDeque::with_capacity(MAX_HISTORY) }) }
    }

    pub fn current(&self) -> Screen { self.inner.lock().current.clone() }

    pub fn location(&self) -> Location { self.inner.lock().current.location.clone() }

    pub fn history_len(&self) -> usize { self.inner.lock().history.len() }

    /// Go to `path`, following redirects, and record the previous location.
    pub fn navigate(&self, path: &str) -> Screen {
        let screen = self.settle(path, None);
        let mut st = self.inner.lock();
        let prev = std::mem::replace(&mut st.current, screen.clone());
        if st.history.len() == MAX_HISTORY {
            st.history.pop_front();
        }
        st.history.push_back(prev.location);
        screen
    }

    /// Return to the previous location, gating it again. `None` when there is no history.
    pub fn back(&self) -> Option<Screen> {
        let prev = self.inner.lock().history.pop_back()?;
        let screen = self.settle(&prev.path, prev.from);
        self.inner.lock().current = screen.clone();
        Some(screen)
    }

    /// Where to go after a successful login: the captured origin, else the dashboard.
    pub fn post_login_target(&self) -> String {
        self.inner.lock().current.location.from.clone().unwrap_or_else(|| DASHBOARD_PATH.to_string())
    }

    /// Replace the current screen with the login page without recording history.
    pub fn force_login(&self) -> Screen {
        warn!(target: "router", "forcing navigation to {LOGIN_PATH}");
        let screen = Screen { location: Location { path: LOGIN_PATH.to_string(), from: None }, view: View::Page(Page::Login) };
        self.inner.lock().current = screen.clone();
        screen
    }

    fn settle(&self, path: &str, mut from: Option<String>) -> Screen {
        let session = self.store.snapshot();
        let mut path = normalize_path(path);
        for _ in 0..MAX_REDIRECTS {
            match evaluate(&session, &path) {
                Navigation::Render(page) => {
                    info!(target: "router", %path, page = page.title(), "render");
                    return Screen { location: Location { path, from }, view: View::Page(page) };
                }
                Navigation::Denied(denied) => {
                    info!(target: "router", %path, required = %denied.required, "access denied");
                    return Screen { location: Location { path, from }, view: View::Denied(denied) };
                }
                Navigation::Redirect { to, from: origin } => {
                    info!(target: "router", from = %path, %to, "redirect");
                    if origin.is_some() {
                        from = origin;
                    }
                    path = to;
                }
            }
        }
        warn!(target: "router", %path, "redirect limit reached");
        Screen { location: Location::root(), view: View::Page(Page::Home) }
    }
}
