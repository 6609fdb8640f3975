use std::fmt::{Display, Formatter};

use super::session::Session;
use super::user::Role;

/// Roles a route admits.
///
/// An empty set admits every signed-in user. Routes that declare no role
/// filter rely on this, so `RoleSet::any()` and `RoleSet::default()` both
/// produce it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn any() -> Self { Self(Vec::new()) }

    pub fn only(roles: &[Role]) -> Self {
        let mut v: Vec<Role> = Vec::with_capacity(roles.len());
        for r in roles {
            if !v.contains(r) { v.push(*r); }
        }
        Self(v)
    }

    pub fn is_unrestricted(&self) -> bool { self.0.is_empty() }

    pub fn roles(&self) -> &[Role] { &self.0 }

    pub fn admits(&self, role: Role) -> bool { self.is_unrestricted() || self.0.contains(&role) }
}

impl From<&[Role]> for RoleSet {
    fn from(roles: &[Role]) -> Self { Self::only(roles) }
}

impl Display for RoleSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

/// Whether the session's user may open something guarded by `allowed`.
/// No user means no access regardless of the set.
pub fn check_access(session: &Session, allowed: &RoleSet) -> bool {
    match &session.user {
        Some(u) => allowed.admits(u.role),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::User;

    fn session(role: Option<Role>) -> Session {
        let user = role.map(|role| User {
            id: "1".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.com".into(),
            role,
            company: None,
            phone: None,
            avatar: None,
        });
        Session { is_authenticated: user.is_some(), token: user.as_ref().map(|_| "t".to_string()), user, ..Default::default() }
    }

    #[test]
    fn empty_set_admits_everyone_signed_in() {
        for r in Role::ALL.into_iter().chain([Role::Unknown]) {
            assert!(check_access(&session(Some(r)), &RoleSet::any()));
        }
        assert!(!check_access(&session(None), &RoleSet::any()));
    }

    #[test]
    fn membership_is_exact() {
        let admins = RoleSet::only(&[Role::Admin]);
        assert!(check_access(&session(Some(Role::Admin)), &admins));
        assert!(!check_access(&session(Some(Role::Organizer)), &admins));
    }

    #[test]
    fn duplicates_collapse_and_display_joins() {
        let s = RoleSet::only(&[Role::Admin, Role::Organizer, Role::Admin]);
        assert_eq!(s.roles().len(), 2);
        assert_eq!(s.to_string(), "admin, organizer");
    }
}
