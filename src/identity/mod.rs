//! Who the user is and whether they are signed in.
//! Keep the public surface thin and split implementation across sub-modules.

mod auth;
mod authorizer;
mod session;
mod token_store;
mod user;

pub use auth::{
    AuthService, LOAD_USER_FAILED, LOGIN_FAILED, PASSWORD_CHANGE_FAILED, PASSWORD_RESET_FAILED,
    PROFILE_UPDATE_FAILED, REGISTRATION_FAILED, RESET_EMAIL_FAILED,
};
pub use authorizer::{check_access, RoleSet};
pub use session::{reduce, Session, SessionAction, SessionEffect, SessionState, SessionStore, SessionToken};
pub use token_store::{redact, FileTokenStorage, MemoryTokenStorage, TokenStorage};
pub use user::{Role, User};
