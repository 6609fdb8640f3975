//! Account operations that drive the session store.
//!
//! Sign-in style operations (login, register, load-user, password reset)
//! move the store through `Loading` and end in `Authenticated` or `Error`.
//! Profile update, password change and the reset email only notify; a
//! failure there leaves the session as it was.

use std::sync::Arc;

use tracing::{info, warn};

use super::session::{Session, SessionAction, SessionStore};
use super::user::User;
use crate::api::models::{
    ChangePasswordRequest, Credentials, ForgotPasswordRequest, ProfileUpdate, ResetPasswordRequest,
};
use crate::api::AuthApi;
use crate::error::{AppError, AppResult};
use crate::notify::{Notice, Notifier};
use crate::validation::RegisterForm;

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const LOAD_USER_FAILED: &str = "Failed to load user";
pub const PROFILE_UPDATE_FAILED: &str = "Profile update failed";
pub const PASSWORD_CHANGE_FAILED: &str = "Password change failed";
pub const RESET_EMAIL_FAILED: &str = "Failed to send reset email";
pub const PASSWORD_RESET_FAILED: &str = "Password reset failed";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<SessionStore>,
    api: AuthApi,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(store: Arc<SessionStore>, api: AuthApi, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, api, notifier }
    }

    pub fn store(&self) -> &Arc<SessionStore> { &self.store }

    pub fn session(&self) -> Session { self.store.snapshot() }

    /// Startup: verify a stored token by loading its user, otherwise settle
    /// as anonymous without touching the network.
    pub async fn initialize(&self) -> Session {
        if self.store.snapshot().token.is_some() {
            // The store began in Loading; a failure is already in its state.
            let _ = self.load_user().await;
        } else {
            self.store.dispatch(SessionAction::Logout);
        }
        self.store.snapshot()
    }

    pub async fn load_user(&self) -> AppResult<User> {
        self.store.dispatch(SessionAction::Start);
        match self.api.me().await {
            Ok(payload) => {
                self.store.dispatch(SessionAction::Succeed { user: payload.user.clone(), token: None });
                Ok(payload.user)
            }
            Err(e) => {
                warn!(target: "session", "load user failed: {e}");
                let err = e.into_user_facing(LOAD_USER_FAILED);
                self.store.dispatch(SessionAction::Fail { message: err.message().to_string() });
                Err(err)
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> AppResult<Session> {
        self.store.dispatch(SessionAction::Start);
        match self.api.login(credentials).await {
            Ok(payload) => {
                info!(target: "session", email = %payload.user.email, role = %payload.user.role, "signed in");
                let snap = self.store.dispatch(SessionAction::Succeed { user: payload.user, token: Some(payload.token) });
                self.notifier.notify(Notice::success("Login successful!"));
                Ok(snap)
            }
            Err(e) => Err(self.fail(e, LOGIN_FAILED)),
        }
    }

    /// Sends only the backend's registration fields; confirmation and terms stay local.
    pub async fn register(&self, form: &RegisterForm) -> AppResult<Session> {
        self.store.dispatch(SessionAction::Start);
        match self.api.register(&form.to_request()).await {
            Ok(payload) => {
                info!(target: "session", email = %payload.user.email, role = %payload.user.role, "registered");
                let snap = self.store.dispatch(SessionAction::Succeed { user: payload.user, token: Some(payload.token) });
                self.notifier.notify(Notice::success("Registration successful!"));
                Ok(snap)
            }
            Err(e) => Err(self.fail(e, REGISTRATION_FAILED)),
        }
    }

    /// The backend call is best effort; the local session always ends.
    pub async fn logout(&self) -> Session {
        if let Err(e) = self.api.logout().await {
            warn!(target: "session", "logout request failed: {e}");
        }
        let snap = self.store.dispatch(SessionAction::Logout);
        self.notifier.notify(Notice::success("Logged out successfully"));
        snap
    }

    pub async fn update_profile(&self, patch: &ProfileUpdate) -> AppResult<User> {
        match self.api.update_profile(patch).await {
            Ok(payload) => {
                self.store.dispatch(SessionAction::Succeed { user: payload.user.clone(), token: None });
                self.notifier.notify(Notice::success("Profile updated successfully!"));
                Ok(payload.user)
            }
            Err(e) => Err(self.notify_failure(e, PROFILE_UPDATE_FAILED)),
        }
    }

    pub async fn change_password(&self, req: &ChangePasswordRequest) -> AppResult<()> {
        match self.api.change_password(req).await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Password changed successfully!"));
                Ok(())
            }
            Err(e) => Err(self.notify_failure(e, PASSWORD_CHANGE_FAILED)),
        }
    }

    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        match self.api.forgot_password(&ForgotPasswordRequest { email: email.to_string() }).await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Password reset email sent!"));
                Ok(())
            }
            Err(e) => Err(self.notify_failure(e, RESET_EMAIL_FAILED)),
        }
    }

    /// A successful reset signs the user in with the token it returns.
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> AppResult<Session> {
        let req = ResetPasswordRequest { password: new_password.to_string() };
        match self.api.reset_password(reset_token, &req).await {
            Ok(payload) => {
                self.store.dispatch(SessionAction::Start);
                let snap = self.store.dispatch(SessionAction::Succeed { user: payload.user, token: Some(payload.token) });
                self.notifier.notify(Notice::success("Password reset successful!"));
                Ok(snap)
            }
            Err(e) => Err(self.notify_failure(e, PASSWORD_RESET_FAILED)),
        }
    }

    pub fn clear_error(&self) -> Session { self.store.dispatch(SessionAction::ClearError) }

    fn fail(&self, e: AppError, fallback: &str) -> AppError {
        let err = e.into_user_facing(fallback);
        self.store.dispatch(SessionAction::Fail { message: err.message().to_string() });
        self.notifier.notify(Notice::error(err.message()));
        err
    }

    fn notify_failure(&self, e: AppError, fallback: &str) -> AppError {
        let err = e.into_user_facing(fallback);
        self.notifier.notify(Notice::error(err.message()));
        err
    }
}
