use axum::body::Bytes;
use serde::{Deserialize, Serialize};

use super::user::User;

/// Three-tier hazard severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Verde,
    Amarillo,
    Rojo,
}

/// Risk level text outside of the closed set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unrecognized risk level `{0}`")]
pub struct InvalidRiskLevel(pub String);

impl RiskLevel {
    /// Exact match on the wire name.
    pub fn parse(value: &str) -> Result<Self, InvalidRiskLevel> {
        match value {
            "Verde" => Ok(RiskLevel::Verde),
            "Amarillo" => Ok(RiskLevel::Amarillo),
            "Rojo" => Ok(RiskLevel::Rojo),
            other => Err(InvalidRiskLevel(other.to_owned())),
        }
    }

    /// Parse, falling back to [`RiskLevel::Amarillo`] on unknown values.
    pub fn coerce(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "defaulting risk level to Amarillo");
            RiskLevel::Amarillo
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Verde => "Verde / Seguro",
            RiskLevel::Amarillo => "Amarillo / Precaución",
            RiskLevel::Rojo => "Rojo / Peligro",
        }
    }

    /// Colour used for the label on exported documents.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            RiskLevel::Verde => (0x16, 0x65, 0x34),
            RiskLevel::Amarillo => (0x85, 0x4d, 0x0e),
            RiskLevel::Rojo => (0x99, 0x1b, 0x1b),
        }
    }
}

/// Findings as returned by the analysis service, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFindings {
    pub risk_level: String,
    pub anomaly_description: String,
    pub ppe_recommendation: String,
    pub infrastructure_suggestion: String,
    pub legal_reference: String,
}

impl RawFindings {
    /// Validate the risk level.
    ///
    /// Unknown levels are coerced to Amarillo unless `strict` is set.
    pub fn into_findings(self, strict: bool) -> Result<Findings, InvalidRiskLevel> {
        let risk_level = if strict {
            RiskLevel::parse(&self.risk_level)?
        } else {
            RiskLevel::coerce(&self.risk_level)
        };

        Ok(Findings {
            risk_level,
            anomaly_description: self.anomaly_description,
            ppe_recommendation: self.ppe_recommendation,
            infrastructure_suggestion: self.infrastructure_suggestion,
            legal_reference: self.legal_reference,
        })
    }
}

/// Validated analysis output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Findings {
    pub risk_level: RiskLevel,
    pub anomaly_description: String,
    pub ppe_recommendation: String,
    pub infrastructure_suggestion: String,
    pub legal_reference: String,
}

/// How the evidence photo was obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Camera,
    #[default]
    Upload,
}

/// Photo held in memory for analysis and export.
#[derive(Clone, Debug, PartialEq)]
pub struct EvidenceImage {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
    pub source: ImageSource,
}

/// Completed hazard assessment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub id: Option<String>,
    pub risk_level: RiskLevel,
    pub anomaly_description: String,
    pub ppe_recommendation: String,
    pub infrastructure_suggestion: String,
    pub legal_reference: String,
    pub location: String,
    /// RFC 3339 timestamp.
    pub date: String,
    pub image_url: String,
    /// Snapshot of the author at submission time.
    pub user: User,
    #[serde(skip)]
    pub evidence: Option<EvidenceImage>,
}

impl ReportData {
    /// Merge analysis output with the fields known to the client.
    pub fn from_findings(
        findings: Findings,
        location: String,
        date: String,
        evidence: EvidenceImage,
        user: User,
    ) -> Self {
        Self {
            id: None,
            risk_level: findings.risk_level,
            anomaly_description: findings.anomaly_description,
            ppe_recommendation: findings.ppe_recommendation,
            infrastructure_suggestion: findings.infrastructure_suggestion,
            legal_reference: findings.legal_reference,
            location,
            date,
            image_url: String::default(),
            user,
            evidence: Some(evidence),
        }
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id().to_owned(),
            risk_level: self.risk_level,
            risk_label: self.risk_level.label().to_owned(),
            location: self.location.clone(),
            date: self.date.clone(),
            user_name: self.user.name.clone(),
        }
    }
}

/// History list entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub risk_level: RiskLevel,
    pub risk_label: String,
    pub location: String,
    pub date: String,
    pub user_name: String,
}
