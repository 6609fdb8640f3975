//! Client-side routes, the authentication and role gates, and the dashboard menu.

mod menu;
mod router;
pub mod routes;

pub use menu::{menu_for, DashboardShell, MenuItem, ShellEntry};
pub use router::{
    evaluate, require_authenticated, require_roles, AccessDenied, Location, Navigation, Router, Screen, View,
};
pub use routes::{Page, DASHBOARD_HOME_PATH, DASHBOARD_PATH, LOGIN_PATH, ROOT_PATH};
