//! The route table: every path the client knows, the page it shows and who may open it.

use crate::identity::{Role, RoleSet};

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const DASHBOARD_HOME_PATH: &str = "/dashboard/home";
pub const ROOT_PATH: &str = "/";

const ADMIN: &[Role] = &[Role::Admin];
const ORGANIZERS: &[Role] = &[Role::Admin, Role::Organizer];
const EXHIBITORS: &[Role] = &[Role::Admin, Role::Organizer, Role::Exhibitor];
const MEMBERS: &[Role] = &[Role::Admin, Role::Organizer, Role::Exhibitor, Role::Attendee];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Expos,
    ExpoDetail { id: String },
    Login,
    Register,
    ForgotPassword,
    ResetPassword { token: String },
    DashboardHome,
    ExpoManagement,
    UserManagement,
    Analytics,
    CreateExpo,
    MyExpos,
    ExhibitorApplications,
    Attendees,
    BoothManagement,
    Schedule,
    CompanyProfile,
    MyApplications,
    MyBooth,
    ExhibitorAnalytics,
    AttendeeProfile,
    Registrations,
    Sessions,
    ExhibitorDirectory,
    Networking,
    Profile,
    Feedback,
    Messages,
    Notifications,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "EventSphere",
            Page::Expos => "Expos",
            Page::ExpoDetail { .. } => "Expo",
            Page::Login => "Sign in",
            Page::Register => "Create account",
            Page::ForgotPassword => "Forgot password",
            Page::ResetPassword { .. } => "Reset password",
            Page::DashboardHome => "Dashboard",
            Page::ExpoManagement => "Expo Management",
            Page::UserManagement => "User Management",
            Page::Analytics => "Analytics & Reports",
            Page::CreateExpo => "Create Expo",
            Page::MyExpos => "My Expos",
            Page::ExhibitorApplications => "Applications",
            Page::Attendees => "Attendees",
            Page::BoothManagement => "Booth Management",
            Page::Schedule => "Schedule",
            Page::CompanyProfile => "Company Profile",
            Page::MyApplications => "My Applications",
            Page::MyBooth => "My Booth",
            Page::ExhibitorAnalytics => "Analytics",
            Page::AttendeeProfile => "Attendee Profile",
            Page::Registrations => "My Registrations",
            Page::Sessions => "Session Schedule",
            Page::ExhibitorDirectory => "Exhibitor Directory",
            Page::Networking => "Networking",
            Page::Profile => "Profile",
            Page::Feedback => "Support",
            Page::Messages => "Messages",
            Page::Notifications => "Notifications",
        }
    }
}

/// Who may open a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Sign-in pages; a signed-in visitor is sent on to the dashboard.
    Guest,
    /// Inside `/dashboard`: a user is required, then the role set applies.
    Dashboard(RoleSet),
}

/// What a path resolves to before any gate runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Route { page: Page, access: Access },
    /// Unconditional redirect (index routes and the catch-all).
    Redirect(&'static str),
}

type Build = fn(&[&str]) -> Page;

struct RouteDef {
    pattern: &'static str,
    build: Build,
    access: fn() -> Access,
}

fn public() -> Access { Access::Public }
fn guest() -> Access { Access::Guest }
fn any_member() -> Access { Access::Dashboard(RoleSet::any()) }
fn admin() -> Access { Access::Dashboard(RoleSet::only(ADMIN)) }
fn organizers() -> Access { Access::Dashboard(RoleSet::only(ORGANIZERS)) }
fn exhibitors() -> Access { Access::Dashboard(RoleSet::only(EXHIBITORS)) }
fn members() -> Access { Access::Dashboard(RoleSet::only(MEMBERS)) }

macro_rules! fixed {
    ($page:expr) => {
        |_: &[&str]| $page
    };
}

const ROUTES: &[RouteDef] = &[
    RouteDef { pattern: "/", build: fixed!(Page::Home), access: public },
    RouteDef { pattern: "/expos", build: fixed!(Page::Expos), access: public },
    RouteDef { pattern: "/expos/:id", build: |p| Page::ExpoDetail { id: p[0].to_string() }, access: public },
    RouteDef { pattern: "/auth/login", build: fixed!(Page::Login), access: guest },
    RouteDef { pattern: "/auth/register", build: fixed!(Page::Register), access: guest },
    RouteDef { pattern: "/auth/forgot-password", build: fixed!(Page::ForgotPassword), access: public },
    RouteDef {
        pattern: "/auth/reset-password/:token",
        build: |p| Page::ResetPassword { token: p[0].to_string() },
        access: public,
    },
    RouteDef { pattern: "/dashboard/home", build: fixed!(Page::DashboardHome), access: any_member },
    RouteDef { pattern: "/dashboard/expos", build: fixed!(Page::ExpoManagement), access: admin },
    RouteDef { pattern: "/dashboard/users", build: fixed!(Page::UserManagement), access: admin },
    RouteDef { pattern: "/dashboard/analytics", build: fixed!(Page::Analytics), access: admin },
    RouteDef { pattern: "/dashboard/create-expo", build: fixed!(Page::CreateExpo), access: organizers },
    RouteDef { pattern: "/dashboard/my-expos", build: fixed!(Page::MyExpos), access: organizers },
    RouteDef {
        pattern: "/dashboard/exhibitor-applications",
        build: fixed!(Page::ExhibitorApplications),
        access: organizers,
    },
    RouteDef { pattern: "/dashboard/attendees", build: fixed!(Page::Attendees), access: organizers },
    RouteDef { pattern: "/dashboard/booths", build: fixed!(Page::BoothManagement), access: organizers },
    RouteDef { pattern: "/dashboard/schedule", build: fixed!(Page::Schedule), access: organizers },
    RouteDef { pattern: "/dashboard/company-profile", build: fixed!(Page::CompanyProfile), access: exhibitors },
    RouteDef { pattern: "/dashboard/applications", build: fixed!(Page::MyApplications), access: exhibitors },
    RouteDef { pattern: "/dashboard/booth", build: fixed!(Page::MyBooth), access: exhibitors },
    RouteDef {
        pattern: "/dashboard/exhibitor-analytics",
        build: fixed!(Page::ExhibitorAnalytics),
        access: exhibitors,
    },
    RouteDef { pattern: "/dashboard/attendee-profile", build: fixed!(Page::AttendeeProfile), access: members },
    RouteDef { pattern: "/dashboard/registrations", build: fixed!(Page::Registrations), access: members },
    RouteDef { pattern: "/dashboard/sessions", build: fixed!(Page::Sessions), access: members },
    RouteDef { pattern: "/dashboard/exhibitors", build: fixed!(Page::ExhibitorDirectory), access: members },
    RouteDef { pattern: "/dashboard/networking", build: fixed!(Page::Networking), access: members },
    RouteDef { pattern: "/dashboard/profile", build: fixed!(Page::Profile), access: any_member },
    RouteDef { pattern: "/dashboard/feedback", build: fixed!(Page::Feedback), access: any_member },
    RouteDef { pattern: "/dashboard/messages", build: fixed!(Page::Messages), access: any_member },
    RouteDef { pattern: "/dashboard/notifications", build: fixed!(Page::Notifications), access: any_member },
];

/// Strip query, fragment and trailing slashes. The root stays `/`.
pub fn normalize_path(raw: &str) -> String {
    let path = raw.split(['?', '#']).next().unwrap_or("").trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        ROOT_PATH.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn match_pattern<'a>(pattern: &str, path: &'a str) -> Option<Vec<&'a str>> {
    let pat: Vec<&str> = pattern.split('/').collect();
    let segs: Vec<&str> = path.split('/').collect();
    if pat.len() != segs.len() {
        return None;
    }
    let mut params = Vec::new();
    for (p, s) in pat.iter().zip(segs.iter()) {
        if p.starts_with(':') {
            if s.is_empty() {
                return None;
            }
            params.push(*s);
        } else if p != s {
            return None;
        }
    }
    Some(params)
}

/// Resolve a (normalized) path. Unknown paths redirect to `/`.
pub fn resolve(path: &str) -> Resolved {
    if path == DASHBOARD_PATH {
        return Resolved::Redirect(DASHBOARD_HOME_PATH);
    }
    for def in ROUTES {
        if let Some(params) = match_pattern(def.pattern, path) {
            return Resolved::Route { page: (def.build)(&params), access: (def.access)() };
        }
    }
    Resolved::Redirect(ROOT_PATH)
}

/// Every concrete path pattern in declaration order.
pub fn patterns() -> impl Iterator<Item = &'static str> {
    ROUTES.iter().map(|d| d.pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles_of(path: &str) -> Option<Vec<Role>> {
        match resolve(path) {
            Resolved::Route { access: Access::Dashboard(set), .. } => Some(set.roles().to_vec()),
            _ => None,
        }
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/dashboard/"), "/dashboard");
        assert_eq!(normalize_path("dashboard/users?x=1#top"), "/dashboard/users");
    }

    #[test]
    fn parameters_are_captured() {
        assert_eq!(
            resolve("/expos/abc123"),
            Resolved::Route { page: Page::ExpoDetail { id: "abc123".into() }, access: Access::Public }
        );
        assert!(matches!(
            resolve("/auth/reset-password/tok"),
            Resolved::Route { page: Page::ResetPassword { token }, .. } if token == "tok"
        ));
    }

    #[test]
    fn index_and_catch_all_redirect() {
        assert_eq!(resolve("/dashboard"), Resolved::Redirect(DASHBOARD_HOME_PATH));
        assert_eq!(resolve("/nowhere"), Resolved::Redirect(ROOT_PATH));
        assert_eq!(resolve("/dashboard/unknown"), Resolved::Redirect(ROOT_PATH));
    }

    #[test]
    fn role_sets_follow_the_table() {
        assert_eq!(roles_of("/dashboard/users"), Some(vec![Role::Admin]));
        assert_eq!(roles_of("/dashboard/schedule"), Some(vec![Role::Admin, Role::Organizer]));
        assert_eq!(roles_of("/dashboard/booth"), Some(vec![Role::Admin, Role::Organizer, Role::Exhibitor]));
        assert_eq!(roles_of("/dashboard/networking").map(|r| r.len()), Some(4));
        assert_eq!(roles_of("/dashboard/messages"), Some(vec![]));
        assert_eq!(roles_of("/expos"), None);
    }

    #[test]
    fn patterns_are_unique() {
        let all: Vec<_> = patterns().collect();
        let mut dedup = all.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(all.len(), dedup.len());
    }
}
