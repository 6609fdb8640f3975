use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Platform role. Decides menu contents and which dashboard routes open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Organizer,
    Exhibitor,
    Attendee,
    /// Anything the backend sends that this client does not know about.
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Organizer, Role::Exhibitor, Role::Attendee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::Exhibitor => "exhibitor",
            Role::Attendee => "attendee",
            Role::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Organizer => "Organizer",
            Role::Exhibitor => "Exhibitor",
            Role::Attendee => "Attendee",
            Role::Unknown => "User",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "organizer" => Ok(Role::Organizer),
            "exhibitor" => Ok(Role::Exhibitor),
            "attendee" => Ok(Role::Attendee),
            other => Err(AppError::field("role", format!("unknown role '{other}'"))),
        }
    }
}

/// The signed-in account as returned by `/auth/me`, login and register.
/// Read-only from the client's point of view apart from profile updates,
/// which replace the whole record with the server's copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn initials(&self) -> String {
        let first = self.first_name.chars().next();
        let last = self.last_name.chars().next();
        first.into_iter().chain(last).flat_map(char::to_uppercase).collect()
    }

    pub fn has_role(&self, role: Role) -> bool { self.role == role }

    pub fn has_any_role(&self, roles: &[Role]) -> bool { roles.contains(&self.role) }

    pub fn is_admin(&self) -> bool { self.has_role(Role::Admin) }
    pub fn is_organizer(&self) -> bool { self.has_role(Role::Organizer) }
    pub fn is_exhibitor(&self) -> bool { self.has_role(Role::Exhibitor) }
    pub fn is_attendee(&self) -> bool { self.has_role(Role::Attendee) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str, role: Role) -> User {
        User {
            id: "u1".into(),
            first_name: first.into(),
            last_name: last.into(),
            email: "a@b.com".into(),
            role,
            company: None,
            phone: None,
            avatar: None,
        }
    }

    #[test]
    fn decodes_backend_shape_with_mongo_id() {
        let raw = r#"{"_id":"64f0","firstName":"Ada","lastName":"Lovelace","email":"ada@x.io","role":"organizer","company":"Engines"}"#;
        let u: User = serde_json::from_str(raw).unwrap();
        assert_eq!(u.id, "64f0");
        assert_eq!(u.role, Role::Organizer);
        assert_eq!(u.company.as_deref(), Some("Engines"));
        assert_eq!(u.avatar, None);
    }

    #[test]
    fn unknown_role_strings_decode_to_unknown() {
        let raw = r#"{"id":"1","email":"x@y.z","role":"superuser"}"#;
        let u: User = serde_json::from_str(raw).unwrap();
        assert_eq!(u.role, Role::Unknown);
    }

    #[test]
    fn names_and_initials() {
        let u = user("grace", "hopper", Role::Admin);
        assert_eq!(u.full_name(), "grace hopper");
        assert_eq!(u.initials(), "GH");
        assert_eq!(user("", "", Role::Admin).initials(), "");
    }

    #[test]
    fn role_predicates() {
        let u = user("a", "b", Role::Exhibitor);
        assert!(u.is_exhibitor());
        assert!(!u.is_admin());
        assert!(u.has_any_role(&[Role::Admin, Role::Exhibitor]));
        assert!(!u.has_any_role(&[]));
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }
}
