//! Role-aware dashboard shell: menu sections and the ticket summary.

use crate::models::{Role, Ticket, User};

/// Number of tickets listed under "Recent Activity"
pub const RECENT_TICKET_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Dashboard,
    Analytics,
    Orders,
    UserManagement,
    Settings,
    Projects,
    Reports,
    Calendar,
    Documents,
    Help,
    Logout,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Dashboard => "Dashboard",
            MenuAction::Analytics => "Analytics",
            MenuAction::Orders => "Orders",
            MenuAction::UserManagement => "User Management",
            MenuAction::Settings => "Settings",
            MenuAction::Projects => "Projects",
            MenuAction::Reports => "Reports",
            MenuAction::Calendar => "Calendar",
            MenuAction::Documents => "Documents",
            MenuAction::Help => "Help",
            MenuAction::Logout => "Logout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub title: &'static str,
    pub items: Vec<MenuAction>,
}

/// Sidebar sections visible to a role. Administration is for admins,
/// Management for managers (and admins, who satisfy every role).
pub fn menu_for(role: &Role) -> Vec<MenuSection> {
    let mut sections = vec![MenuSection {
        title: "Main",
        items: vec![MenuAction::Dashboard, MenuAction::Analytics, MenuAction::Orders],
    }];

    if *role == Role::Admin {
        sections.push(MenuSection {
            title: "Administration",
            items: vec![MenuAction::UserManagement, MenuAction::Settings],
        });
    }

    if role.satisfies(&Role::Manager) {
        sections.push(MenuSection {
            title: "Management",
            items: vec![MenuAction::Projects, MenuAction::Reports],
        });
    }

    sections.push(MenuSection {
        title: "General",
        items: vec![
            MenuAction::Calendar,
            MenuAction::Documents,
            MenuAction::Help,
            MenuAction::Logout,
        ],
    });
    sections
}

/// Flattened menu, in display order
pub fn menu_items(role: &Role) -> Vec<MenuAction> {
    menu_for(role).into_iter().flat_map(|s| s.items).collect()
}

/// Ticket counts shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub tickets: Vec<Ticket>,
    pub owned_by_user: usize,
}

impl DashboardSummary {
    pub fn new(mut tickets: Vec<Ticket>, user: &User) -> Self {
        // Newest first; ids are assigned in creation order
        tickets.sort_by(|a, b| b.id.cmp(&a.id));
        let owned_by_user = tickets.iter().filter(|t| t.owner_id == user.id).count();
        Self {
            tickets,
            owned_by_user,
        }
    }

    pub fn total(&self) -> usize {
        self.tickets.len()
    }

    pub fn recent(&self) -> &[Ticket] {
        &self.tickets[..self.tickets.len().min(RECENT_TICKET_COUNT)]
    }
}
