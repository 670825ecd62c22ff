//! What a session currently shows, as JSON.

use serde::Serialize;

use crate::analysis::READ_ONLY_NOTICE;
use crate::analysis::workflow::WorkflowStatus;
use crate::error::{Result, ServerError};
use crate::model::guide::{CHEMICAL_GUIDE, ChemicalGroup, GuideSection, USER_GUIDE};
use crate::model::{ReportData, ReportSummary, User};
use crate::navigation::{Target, View};
use crate::report::ReportStore;
use crate::session::Session;
use crate::user::UserRepository;

const DISABLED_TITLE: &str = "Función no disponible";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Screen {
    Scan {
        workflow: WorkflowStatus,
    },
    /// Scan screen of read-only roles.
    ScanDisabled {
        title: &'static str,
        notice: &'static str,
    },
    History {
        reports: Vec<ReportSummary>,
    },
    Chemicals {
        groups: &'static [ChemicalGroup],
    },
    Users {
        users: Vec<User>,
    },
    Guide {
        sections: &'static [GuideSection],
    },
    #[serde(rename_all = "camelCase")]
    Report {
        report: ReportData,
        risk_label: &'static str,
        pdf_url: String,
    },
}

impl Screen {
    pub fn report(report: ReportData) -> Self {
        Screen::Report {
            risk_label: report.risk_level.label(),
            pdf_url: format!("/reports/{}/pdf", report.id()),
            report,
        }
    }

    pub fn scan(session: &Session) -> Self {
        if session.user.role.is_read_only() {
            Screen::ScanDisabled {
                title: DISABLED_TITLE,
                notice: READ_ONLY_NOTICE,
            }
        } else {
            Screen::Scan {
                workflow: session.workflow.status(),
            }
        }
    }

    pub fn history(reports: &ReportStore, user: &User) -> Self {
        Screen::History {
            reports: reports
                .visible_to(user)
                .iter()
                .map(ReportData::summary)
                .collect(),
        }
    }
}

/// Render the session's target. A selected report wins over the view.
pub fn render(
    session: &Session,
    reports: &ReportStore,
    users: &UserRepository,
) -> Result<Screen> {
    let screen = match session.navigator.target() {
        Target::Report(id) => reports
            .find_visible(&session.user, &id)
            .map(Screen::report)
            .ok_or_else(|| ServerError::NotFound(format!("report `{id}`")))?,
        Target::View(View::Scan) => Screen::scan(session),
        Target::View(View::History) => Screen::history(reports, &session.user),
        Target::View(View::Chemicals) => Screen::Chemicals {
            groups: CHEMICAL_GUIDE,
        },
        Target::View(View::Users) => Screen::Users { users: users.list() },
        Target::View(View::Guide) => Screen::Guide {
            sections: USER_GUIDE,
        },
    };

    Ok(screen)
}
