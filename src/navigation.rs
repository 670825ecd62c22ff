//! Role-gated views and the per-session view router.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::model::HierarchicalRole;

use HierarchicalRole::*;

/// Screens reachable from the menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Scan,
    History,
    Chemicals,
    Users,
    Guide,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Scan => "scan",
            View::History => "history",
            View::Chemicals => "chemicals",
            View::Users => "users",
            View::Guide => "guide",
        }
    }

    /// Whether the menu exposes this view to `role`.
    pub fn permits(&self, role: HierarchicalRole) -> bool {
        NAVIGATION
            .iter()
            .find(|entry| entry.view == *self)
            .is_some_and(|entry| entry.roles.contains(&role))
    }

    /// Views with a read-only rendering for roles outside the menu.
    fn has_read_only_screen(&self) -> bool {
        matches!(self, View::Scan)
    }
}

/// One row of the permission table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NavEntry {
    pub view: View,
    pub label: &'static str,
    #[serde(skip)]
    pub roles: &'static [HierarchicalRole],
}

/// View → allowed roles, in menu order.
pub const NAVIGATION: &[NavEntry] = &[
    NavEntry {
        view: View::Scan,
        label: "Analizar Riesgo",
        roles: &[Director, Intendente, Mayordomo, PersonalDeServicio],
    },
    NavEntry {
        view: View::History,
        label: "Historial",
        roles: &HierarchicalRole::ALL,
    },
    NavEntry {
        view: View::Chemicals,
        label: "Guía de Químicos",
        roles: &HierarchicalRole::ALL,
    },
    NavEntry {
        view: View::Users,
        label: "Gestionar Usuarios",
        roles: &[Director],
    },
    NavEntry {
        view: View::Guide,
        label: "Guía de Usuario",
        roles: &HierarchicalRole::ALL,
    },
];

/// Menu entries visible to `role`.
pub fn menu(role: HierarchicalRole) -> Vec<NavEntry> {
    NAVIGATION
        .iter()
        .filter(|entry| entry.roles.contains(&role))
        .copied()
        .collect()
}

/// First screen after login.
pub fn landing_view(role: HierarchicalRole) -> View {
    if role.sees_all_reports() {
        View::History
    } else {
        View::Scan
    }
}

/// Active view plus the report detail overriding it.
#[derive(Clone, Debug, PartialEq)]
pub struct Navigator {
    active: View,
    selected: Option<String>,
}

/// What the client should currently display.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    View(View),
    Report(String),
}

impl Navigator {
    pub fn new(role: HierarchicalRole) -> Self {
        Self {
            active: landing_view(role),
            selected: None,
        }
    }

    pub fn active(&self) -> View {
        self.active
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Switch view, dropping any selected report.
    pub fn navigate(&mut self, view: View, role: HierarchicalRole) -> Result<()> {
        if !view.permits(role) && !view.has_read_only_screen() {
            tracing::debug!(view = view.as_str(), %role, "navigation refused");
            return Err(ServerError::Forbidden { view, role });
        }

        self.selected = None;
        self.active = view;
        Ok(())
    }

    /// Show a report detail on top of the active view.
    pub fn select(&mut self, report_id: impl Into<String>) {
        self.selected = Some(report_id.into());
    }

    /// Leave the detail screen for the history list.
    pub fn back(&mut self) {
        self.selected = None;
        self.active = View::History;
    }

    pub fn target(&self) -> Target {
        match &self.selected {
            Some(id) => Target::Report(id.clone()),
            None => Target::View(self.active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(role: HierarchicalRole) -> Vec<View> {
        menu(role).into_iter().map(|entry| entry.view).collect()
    }

    #[test]
    fn test_menu_matches_permission_table() {
        use View::*;

        assert_eq!(
            views(HierarchicalRole::Director),
            vec![Scan, History, Chemicals, Users, Guide]
        );
        for role in [Intendente, Mayordomo, PersonalDeServicio] {
            assert_eq!(views(role), vec![Scan, History, Chemicals, Guide]);
        }
        assert_eq!(
            views(HierarchicalRole::Autoridades),
            vec![History, Chemicals, Guide]
        );
    }

    #[test]
    fn test_menu_is_stable() {
        for role in HierarchicalRole::ALL {
            assert_eq!(menu(role), menu(role));
        }
    }

    #[test]
    fn test_permits_agrees_with_menu() {
        for role in HierarchicalRole::ALL {
            let visible = views(role);
            for entry in NAVIGATION {
                assert_eq!(entry.view.permits(role), visible.contains(&entry.view));
            }
        }
    }

    #[test]
    fn test_landing_view() {
        assert_eq!(landing_view(Director), View::History);
        assert_eq!(landing_view(Autoridades), View::History);
        assert_eq!(landing_view(Intendente), View::Scan);
        assert_eq!(landing_view(Mayordomo), View::Scan);
        assert_eq!(landing_view(PersonalDeServicio), View::Scan);
    }

    #[test]
    fn test_navigate_clears_selection() {
        let mut nav = Navigator::new(Mayordomo);
        nav.select("rep1");
        assert_eq!(nav.target(), Target::Report("rep1".into()));

        nav.navigate(View::Chemicals, Mayordomo).unwrap();
        assert_eq!(nav.selected(), None);
        assert_eq!(nav.target(), Target::View(View::Chemicals));
    }

    #[test]
    fn test_navigate_refuses_users_view() {
        let mut nav = Navigator::new(Intendente);
        nav.select("rep2");

        let err = nav.navigate(View::Users, Intendente).unwrap_err();
        assert!(matches!(err, ServerError::Forbidden { view: View::Users, .. }));
        // Refused navigation leaves the router untouched.
        assert_eq!(nav.target(), Target::Report("rep2".into()));
    }

    #[test]
    fn test_read_only_role_may_land_on_scan() {
        let mut nav = Navigator::new(Autoridades);
        assert_eq!(nav.active(), View::History);
        nav.navigate(View::Scan, Autoridades).unwrap();
        assert_eq!(nav.active(), View::Scan);
    }

    #[test]
    fn test_back_returns_to_history() {
        let mut nav = Navigator::new(PersonalDeServicio);
        nav.select("rep-1");
        nav.back();
        assert_eq!(nav.target(), Target::View(View::History));
    }
}
