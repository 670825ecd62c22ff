use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed permission tiers of the institution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchicalRole {
    Director,
    Intendente,
    Mayordomo,
    #[serde(rename = "Personal de Servicio")]
    PersonalDeServicio,
    Autoridades,
}

impl HierarchicalRole {
    /// Every role, in hierarchy order.
    pub const ALL: [HierarchicalRole; 5] = [
        HierarchicalRole::Director,
        HierarchicalRole::Intendente,
        HierarchicalRole::Mayordomo,
        HierarchicalRole::PersonalDeServicio,
        HierarchicalRole::Autoridades,
    ];

    /// Human readable role name, as stored on reports and documents.
    pub fn label(&self) -> &'static str {
        match self {
            HierarchicalRole::Director => "Director",
            HierarchicalRole::Intendente => "Intendente",
            HierarchicalRole::Mayordomo => "Mayordomo",
            HierarchicalRole::PersonalDeServicio => "Personal de Servicio",
            HierarchicalRole::Autoridades => "Autoridades",
        }
    }

    /// Whether the role sees every report instead of only its own.
    pub fn sees_all_reports(&self) -> bool {
        matches!(
            self,
            HierarchicalRole::Director | HierarchicalRole::Autoridades
        )
    }

    /// Monitoring roles cannot submit new analyses.
    pub fn is_read_only(&self) -> bool {
        matches!(self, HierarchicalRole::Autoridades)
    }
}

impl fmt::Display for HierarchicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Account as held in the user directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub role: HierarchicalRole,
    pub dni: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    /// Placeholder snapshot for reports whose author cannot be found.
    pub fn unknown() -> Self {
        Self {
            id: 0,
            name: "Unknown User".into(),
            role: HierarchicalRole::PersonalDeServicio,
            dni: "N/A".into(),
            email: "N/A".into(),
            password: None,
            avatar_url: None,
        }
    }
}
