//! Session state machine and the store that owns it.
//!
//! Transitions are computed by the pure [`reduce`] function, which also
//! reports the durable-storage effects a transition requires. The store
//! swaps the state under a lock, applies the effects, and publishes the new
//! [`Session`] snapshot to subscribers. Only one transition is processed at
//! a time.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};

use super::token_store::{redact, TokenStorage};
use super::user::{Role, User};

pub type SessionToken = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    /// A credential check or load-user call is in flight. `token` is the
    /// stored token being verified at startup, if any.
    Loading { user: Option<User>, token: Option<SessionToken> },
    Authenticated { user: User, token: SessionToken },
    Error { message: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Loading { .. } => "loading",
            SessionState::Authenticated { .. } => "authenticated",
            SessionState::Error { .. } => "error",
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Loading { user, .. } => user.as_ref(),
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Loading { token, .. } => token.as_deref(),
            SessionState::Authenticated { token, .. } => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Session {
        let user = self.user().cloned();
        let token = self.token().map(str::to_string);
        Session {
            is_authenticated: user.is_some() && token.is_some(),
            is_loading: matches!(self, SessionState::Loading { .. }),
            error: match self { SessionState::Error { message } => Some(message.clone()), _ => None },
            user,
            token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Login, register or load-user began.
    Start,
    /// Login, register, load-user, profile update or password reset succeeded.
    /// `token` is `None` when the operation did not issue a new one.
    Succeed { user: User, token: Option<SessionToken> },
    Fail { message: String },
    Logout,
    ClearError,
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::Start => "start",
            SessionAction::Succeed { .. } => "succeed",
            SessionAction::Fail { .. } => "fail",
            SessionAction::Logout => "logout",
            SessionAction::ClearError => "clear_error",
        }
    }
}

/// Durable-storage work a transition requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    PersistToken(SessionToken),
    ClearToken,
}

/// Read-only view of the session handed to guards, menus and pages.
/// `is_authenticated` is derived, never stored, so it is true exactly when
/// both `user` and `token` are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<SessionToken>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Session {
    pub fn role(&self) -> Option<Role> { self.user.as_ref().map(|u| u.role) }

    pub fn has_role(&self, role: Role) -> bool { self.user.as_ref().is_some_and(|u| u.has_role(role)) }

    pub fn has_any_role(&self, roles: &[Role]) -> bool { self.user.as_ref().is_some_and(|u| u.has_any_role(roles)) }
}

/// Compute the next state for `action`. Transitions that make no sense from
/// the current state leave it untouched and produce no effects.
pub fn reduce(state: &SessionState, action: SessionAction) -> (SessionState, Vec<SessionEffect>) {
    match action {
        SessionAction::Start => {
            let (user, token) = match state {
                SessionState::Loading { user, token } => (user.clone(), token.clone()),
                SessionState::Authenticated { user, token } => (Some(user.clone()), Some(token.clone())),
                SessionState::Anonymous | SessionState::Error { .. } => (None, None),
            };
            (SessionState::Loading { user, token }, Vec::new())
        }
        SessionAction::Succeed { user, token } => match state {
            SessionState::Loading { .. } | SessionState::Authenticated { .. } => {
                let issued = token.is_some();
                match token.or_else(|| state.token().map(str::to_string)) {
                    Some(token) => {
                        let effects = if issued { vec![SessionEffect::PersistToken(token.clone())] } else { Vec::new() };
                        (SessionState::Authenticated { user, token }, effects)
                    }
                    None => (
                        SessionState::Error { message: "Session token missing".to_string() },
                        vec![SessionEffect::ClearToken],
                    ),
                }
            }
            _ => (state.clone(), Vec::new()),
        },
        SessionAction::Fail { message } => (SessionState::Error { message }, vec![SessionEffect::ClearToken]),
        SessionAction::Logout => (SessionState::Anonymous, vec![SessionEffect::ClearToken]),
        SessionAction::ClearError => match state {
            SessionState::Error { .. } => (SessionState::Anonymous, Vec::new()),
            other => (other.clone(), Vec::new()),
        },
    }
}

/// Owner of the single session. Constructed once by the application and
/// shared by `Arc` with whatever needs to read or change it.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn TokenStorage>,
    tx: watch::Sender<Session>,
}

impl SessionStore {
    /// Initial state is `Loading` when a token is already stored (the caller
    /// is expected to run load-user next), `Anonymous` otherwise.
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let stored = match storage.load() {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "session", "could not read stored token: {e}");
                None
            }
        };
        let state = match stored {
            Some(token) => {
                info!(target: "session", token = %redact(&token), "found stored token");
                SessionState::Loading { user: None, token: Some(token) }
            }
            None => SessionState::Anonymous,
        };
        let (tx, _rx) = watch::channel(state.snapshot());
        Self { state: RwLock::new(state), storage, tx }
    }

    pub fn state(&self) -> SessionState { self.state.read().clone() }

    pub fn snapshot(&self) -> Session { self.state.read().snapshot() }

    pub fn subscribe(&self) -> watch::Receiver<Session> { self.tx.subscribe() }

    pub fn storage(&self) -> Arc<dyn TokenStorage> { self.storage.clone() }

    pub fn dispatch(&self, action: SessionAction) -> Session {
        let name = action.name();
        let mut guard = self.state.write();
        let from = guard.name();
        let (next, effects) = reduce(&guard, action);
        if from == next.name() && effects.is_empty() && *guard == next {
            warn!(target: "session", action = name, state = from, "transition ignored");
        } else {
            info!(target: "session", action = name, from, to = next.name(), "session transition");
        }
        *guard = next;
        // Storage follows the state under the same write lock, so racing
        // dispatches cannot leave the token file behind the state.
        for effect in &effects {
            self.apply(effect);
        }
        let snapshot = guard.snapshot();
        self.tx.send_replace(snapshot.clone());
        snapshot
    }

    fn apply(&self, effect: &SessionEffect) {
        let res = match effect {
            SessionEffect::PersistToken(t) => self.storage.save(t),
            SessionEffect::ClearToken => self.storage.clear(),
        };
        if let Err(e) = res {
            warn!(target: "session", ?effect, "token storage failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::token_store::MemoryTokenStorage;

    fn user(role: Role) -> User {
        User {
            id: "u1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "a@b.com".into(),
            role,
            company: None,
            phone: None,
            avatar: None,
        }
    }

    fn all_states() -> Vec<SessionState> {
        vec![
            SessionState::Anonymous,
            SessionState::Loading { user: None, token: None },
            SessionState::Loading { user: None, token: Some("t".into()) },
            SessionState::Loading { user: Some(user(Role::Admin)), token: Some("t".into()) },
            SessionState::Authenticated { user: user(Role::Admin), token: "t".into() },
            SessionState::Error { message: "x".into() },
        ]
    }

    fn all_actions() -> Vec<SessionAction> {
        vec![
            SessionAction::Start,
            SessionAction::Succeed { user: user(Role::Attendee), token: Some("n".into()) },
            SessionAction::Succeed { user: user(Role::Attendee), token: None },
            SessionAction::Fail { message: "bad".into() },
            SessionAction::Logout,
            SessionAction::ClearError,
        ]
    }

    #[test]
    fn authenticated_iff_user_and_token() {
        for s in all_states() {
            for a in all_actions() {
                let (next, _) = reduce(&s, a);
                let snap = next.snapshot();
                assert_eq!(snap.is_authenticated, snap.user.is_some() && snap.token.is_some(), "{next:?}");
            }
        }
    }

    #[test]
    fn fail_and_logout_always_clear_token() {
        for s in all_states() {
            let (next, fx) = reduce(&s, SessionAction::Fail { message: "Login failed".into() });
            assert_eq!(next, SessionState::Error { message: "Login failed".into() });
            assert_eq!(fx, vec![SessionEffect::ClearToken]);

            let (next, fx) = reduce(&s, SessionAction::Logout);
            assert_eq!(next, SessionState::Anonymous);
            assert_eq!(fx, vec![SessionEffect::ClearToken]);
        }
    }

    #[test]
    fn start_from_error_clears_message() {
        let (next, fx) = reduce(&SessionState::Error { message: "old".into() }, SessionAction::Start);
        assert_eq!(next, SessionState::Loading { user: None, token: None });
        assert!(fx.is_empty());
        assert_eq!(next.snapshot().error, None);
    }

    #[test]
    fn succeed_with_new_token_persists_it() {
        let (next, fx) = reduce(
            &SessionState::Loading { user: None, token: None },
            SessionAction::Succeed { user: user(Role::Organizer), token: Some("fresh".into()) },
        );
        assert_eq!(next, SessionState::Authenticated { user: user(Role::Organizer), token: "fresh".into() });
        assert_eq!(fx, vec![SessionEffect::PersistToken("fresh".into())]);
    }

    #[test]
    fn load_user_success_keeps_stored_token() {
        let (next, fx) = reduce(
            &SessionState::Loading { user: None, token: Some("stored".into()) },
            SessionAction::Succeed { user: user(Role::Attendee), token: None },
        );
        assert_eq!(next.token(), Some("stored"));
        assert!(fx.is_empty());
    }

    #[test]
    fn profile_update_replaces_user_wholesale() {
        let mut updated = user(Role::Admin);
        updated.first_name = "Grace".into();
        updated.company = Some("Navy".into());
        let (next, _) = reduce(
            &SessionState::Authenticated { user: user(Role::Admin), token: "t".into() },
            SessionAction::Succeed { user: updated.clone(), token: None },
        );
        assert_eq!(next.user(), Some(&updated));
    }

    #[test]
    fn succeed_without_any_token_is_an_error_not_stuck_loading() {
        let (next, fx) = reduce(
            &SessionState::Loading { user: None, token: None },
            SessionAction::Succeed { user: user(Role::Admin), token: None },
        );
        assert!(matches!(next, SessionState::Error { .. }));
        assert_eq!(fx, vec![SessionEffect::ClearToken]);
    }

    #[test]
    fn succeed_is_ignored_outside_loading_or_authenticated() {
        for s in [SessionState::Anonymous, SessionState::Error { message: "e".into() }] {
            let (next, fx) = reduce(&s, SessionAction::Succeed { user: user(Role::Admin), token: Some("t".into()) });
            assert_eq!(next, s);
            assert!(fx.is_empty());
        }
    }

    #[test]
    fn clear_error_only_leaves_error() {
        let (next, _) = reduce(&SessionState::Error { message: "e".into() }, SessionAction::ClearError);
        assert_eq!(next, SessionState::Anonymous);
        let authed = SessionState::Authenticated { user: user(Role::Admin), token: "t".into() };
        assert_eq!(reduce(&authed, SessionAction::ClearError).0, authed);
    }

    #[test]
    fn store_starts_loading_with_stored_token() {
        let store = SessionStore::new(Arc::new(MemoryTokenStorage::with_token("t0")));
        let snap = store.snapshot();
        assert!(snap.is_loading);
        assert!(!snap.is_authenticated);
        assert_eq!(snap.token.as_deref(), Some("t0"));
    }

    #[test]
    fn store_starts_anonymous_without_token() {
        let store = SessionStore::new(Arc::new(MemoryTokenStorage::new()));
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn store_applies_effects_and_notifies_subscribers() {
        let storage = Arc::new(MemoryTokenStorage::new());
        let store = SessionStore::new(storage.clone());
        let mut rx = store.subscribe();

        store.dispatch(SessionAction::Start);
        let snap = store.dispatch(SessionAction::Succeed { user: user(Role::Exhibitor), token: Some("tok".into()) });
        assert!(snap.is_authenticated);
        assert_eq!(storage.load().unwrap().as_deref(), Some("tok"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().role(), Some(Role::Exhibitor));

        store.dispatch(SessionAction::Logout);
        assert_eq!(storage.load().unwrap(), None);
        assert!(!store.snapshot().is_authenticated);
    }

    #[test]
    fn racing_dispatches_keep_storage_in_step_with_state() {
        let storage = Arc::new(MemoryTokenStorage::new());
        let store = SessionStore::new(storage.clone());

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for round in 0..200 {
                        store.dispatch(SessionAction::Start);
                        let token = format!("t{worker}-{round}");
                        store.dispatch(SessionAction::Succeed { user: user(Role::Attendee), token: Some(token) });
                        if (worker + round) % 3 == 0 {
                            store.dispatch(SessionAction::Logout);
                        }
                    }
                });
            }
        });

        let state = store.state();
        assert_eq!(storage.load().unwrap().as_deref(), state.token(), "storage diverged from {}", state.name());
        assert_eq!(store.subscribe().borrow().token.as_deref(), state.token());
    }
}
