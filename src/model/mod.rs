//! Plain records shared across the service.
pub mod guide;
pub mod report;
pub mod user;

pub use report::{
    EvidenceImage, Findings, ImageSource, InvalidRiskLevel, RawFindings,
    ReportData, ReportSummary, RiskLevel,
};
pub use user::{HierarchicalRole, User};
