use crate::identity::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub href: &'static str,
}

const fn item(label: &'static str, href: &'static str) -> MenuItem { MenuItem { label, href } }

const LEADING: MenuItem = item("Dashboard", "/dashboard/home");

const TRAILING: &[MenuItem] = &[
    item("Profile", "/dashboard/profile"),
    item("Messages", "/dashboard/messages"),
    item("Notifications", "/dashboard/notifications"),
    item("Support", "/dashboard/feedback"),
];

const ADMIN_ITEMS: &[MenuItem] = &[
    item("Expo Management", "/dashboard/expos"),
    item("User Management", "/dashboard/users"),
    item("Analytics & Reports", "/dashboard/analytics"),
];

const ORGANIZER_ITEMS: &[MenuItem] = &[
    item("Create Expo", "/dashboard/create-expo"),
    item("My Expos", "/dashboard/my-expos"),
    item("Applications", "/dashboard/exhibitor-applications"),
    item("Attendees", "/dashboard/attendees"),
    item("Booth Management", "/dashboard/booths"),
    item("Schedule", "/dashboard/schedule"),
];

const EXHIBITOR_ITEMS: &[MenuItem] = &[
    item("Company Profile", "/dashboard/company-profile"),
    item("My Applications", "/dashboard/applications"),
    item("My Booth", "/dashboard/booth"),
    item("Analytics", "/dashboard/exhibitor-analytics"),
];

const ATTENDEE_ITEMS: &[MenuItem] = &[
    item("My Registrations", "/dashboard/registrations"),
    item("Session Schedule", "/dashboard/sessions"),
    item("Exhibitor Directory", "/dashboard/exhibitors"),
    item("Networking", "/dashboard/networking"),
];

fn role_items(role: Option<Role>) -> &'static [MenuItem] {
    match role {
        Some(Role::Admin) => ADMIN_ITEMS,
        Some(Role::Organizer) => ORGANIZER_ITEMS,
        Some(Role::Exhibitor) => EXHIBITOR_ITEMS,
        Some(Role::Attendee) => ATTENDEE_ITEMS,
        Some(Role::Unknown) | None => &[],
    }
}

/// Leading entry, the role's block, then the shared trailing block.
pub fn menu_for(role: Option<Role>) -> Vec<MenuItem> {
    let mut items = Vec::with_capacity(1 + role_items(role).len() + TRAILING.len());
    items.push(LEADING);
    items.extend_from_slice(role_items(role));
    items.extend_from_slice(TRAILING);
    items
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellEntry {
    pub item: MenuItem,
    pub active: bool,
}

/// Everything the dashboard frame shows around a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardShell {
    pub entries: Vec<ShellEntry>,
    pub full_name: String,
    pub initials: String,
    pub role_label: &'static str,
    pub email: String,
}

impl DashboardShell {
    /// Active means the entry's href equals `path` exactly.
    pub fn build(user: Option<&User>, path: &str) -> Self {
        let role = user.map(|u| u.role);
        let entries = menu_for(role)
            .into_iter()
            .map(|item| ShellEntry { active: item.href == path, item })
            .collect();
        Self {
            entries,
            full_name: user.map(User::full_name).unwrap_or_default(),
            initials: user.map(User::initials).unwrap_or_default(),
            role_label: role.unwrap_or(Role::Unknown).label(),
            email: user.map(|u| u.email.clone()).unwrap_or_default(),
        }
    }

    pub fn active(&self) -> Option<&MenuItem> { self.entries.iter().find(|e| e.active).map(|e| &e.item) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(role: Option<Role>) -> Vec<&'static str> { menu_for(role).iter().map(|i| i.label).collect() }

    #[test]
    fn fixed_blocks_surround_role_block() {
        assert_eq!(
            labels(Some(Role::Exhibitor)),
            vec![
                "Dashboard",
                "Company Profile",
                "My Applications",
                "My Booth",
                "Analytics",
                "Profile",
                "Messages",
                "Notifications",
                "Support"
            ]
        );
    }

    #[test]
    fn unknown_or_missing_role_gets_only_fixed_entries() {
        let fixed = vec!["Dashboard", "Profile", "Messages", "Notifications", "Support"];
        assert_eq!(labels(None), fixed);
        assert_eq!(labels(Some(Role::Unknown)), fixed);
    }

    #[test]
    fn each_role_block_has_expected_size() {
        assert_eq!(menu_for(Some(Role::Admin)).len(), 8);
        assert_eq!(menu_for(Some(Role::Organizer)).len(), 11);
        assert_eq!(menu_for(Some(Role::Attendee)).len(), 9);
    }

    #[test]
    fn every_menu_href_is_a_known_route() {
        let known: Vec<&str> = crate::routing::routes::patterns().collect();
        for role in Role::ALL {
            for item in menu_for(Some(role)) {
                assert!(known.contains(&item.href), "{} not routed", item.href);
            }
        }
    }

    #[test]
    fn shell_marks_exact_match_active() {
        let user = User {
            id: "1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@x.io".into(),
            role: Role::Admin,
            company: None,
            phone: None,
            avatar: None,
        };
        let shell = DashboardShell::build(Some(&user), "/dashboard/users");
        assert_eq!(shell.active().map(|i| i.label), Some("User Management"));
        assert_eq!(shell.entries.iter().filter(|e| e.active).count(), 1);
        assert_eq!((shell.initials.as_str(), shell.role_label), ("AL", "Administrator"));
        assert!(DashboardShell::build(Some(&user), "/dashboard/users/1").active().is_none());
    }
}
