//! In-memory report history, newest first.

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use parking_lot::RwLock;

use crate::clock::Clock;
use crate::fixtures::RawReport;
use crate::model::{ReportData, RiskLevel, User};

const ID_PREFIX: &str = "rep-";

/// Owner of the report list.
#[derive(Clone)]
pub struct ReportStore {
    reports: Arc<RwLock<Vec<ReportData>>>,
    clock: Arc<dyn Clock>,
}

fn timestamp(date: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(date).ok()
}

/// Join stored reports with their authors and order them newest first.
pub fn join(raw: Vec<RawReport>, users: &[User]) -> Vec<ReportData> {
    let mut reports: Vec<ReportData> = raw
        .into_iter()
        .map(|report| {
            let user = match users.iter().find(|u| u.id == report.user_id) {
                Some(user) => user.clone(),
                None => {
                    tracing::error!(
                        user_id = report.user_id,
                        report_id = %report.id,
                        "report author not found"
                    );
                    User::unknown()
                },
            };

            ReportData {
                id: Some(report.id),
                risk_level: RiskLevel::coerce(&report.risk_level),
                anomaly_description: report.anomaly_description,
                ppe_recommendation: report.ppe_recommendation,
                infrastructure_suggestion: report.infrastructure_suggestion,
                legal_reference: report.legal_reference,
                location: report.location,
                date: report.date,
                image_url: report.image_url,
                user,
                evidence: None,
            }
        })
        .collect();

    reports.sort_by_key(|report| Reverse(timestamp(&report.date)));
    reports
}

impl ReportStore {
    /// Create a new [`ReportStore`] from an already ordered list.
    pub fn new(reports: Vec<ReportData>, clock: Arc<dyn Clock>) -> Self {
        Self {
            reports: Arc::new(RwLock::new(reports)),
            clock,
        }
    }

    /// Assign an id and put `report` at the top of the history.
    pub fn prepend(&self, mut report: ReportData) -> ReportData {
        let mut reports = self.reports.write();

        let mut millis = self.clock.now().timestamp_millis();
        let id = loop {
            let candidate = format!("{ID_PREFIX}{millis}");
            if !reports.iter().any(|r| r.id() == candidate) {
                break candidate;
            }
            millis += 1;
        };

        if report.evidence.is_some() {
            report.image_url = format!("/reports/{id}/image");
        }
        report.id = Some(id);

        reports.insert(0, report.clone());
        tracing::info!(
            report_id = report.id(),
            user_id = report.user.id,
            risk_level = ?report.risk_level,
            "report stored"
        );

        report
    }

    /// Reports `user` may see, keeping store order.
    pub fn visible_to(&self, user: &User) -> Vec<ReportData> {
        let reports = self.reports.read();
        if user.role.sees_all_reports() {
            reports.clone()
        } else {
            reports
                .iter()
                .filter(|report| report.user.id == user.id)
                .cloned()
                .collect()
        }
    }

    /// One report, if `user` may see it.
    pub fn find_visible(&self, user: &User, id: &str) -> Option<ReportData> {
        self.reports
            .read()
            .iter()
            .find(|report| report.id() == id)
            .filter(|report| {
                user.role.sees_all_reports() || report.user.id == user.id
            })
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }
}
