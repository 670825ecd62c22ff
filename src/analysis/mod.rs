//! Hazard analysis: the external service port and the submission flow.
mod gemini;
pub mod workflow;

pub use gemini::GeminiAnalyzer;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::SecondsFormat;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::model::{EvidenceImage, InvalidRiskLevel, RawFindings, ReportData};
use crate::session::SessionHandle;
use workflow::SubmitGuard;

pub const READ_ONLY_NOTICE: &str = "Su rol de 'Autoridades' es para fines de monitoreo y no tiene permisos para generar nuevos informes.";

/// Failures of the analysis service. Messages are shown to the user as is.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("La clave de API de Gemini no está configurada.")]
    MissingApiKey,
    #[error("La clave de API no es válida. Por favor, verifíquela.")]
    InvalidApiKey,
    #[error("La respuesta de la API estaba vacía. Intente de nuevo.")]
    EmptyResponse,
    #[error("La respuesta de la API contiene un nivel de riesgo no válido.")]
    RiskLevel(#[from] InvalidRiskLevel),
    #[error(
        "No se pudo analizar la imagen. Verifique la clave de API y la imagen subida."
    )]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AnalysisError {
    pub fn failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AnalysisError::Failed(Box::new(err))
    }

    fn outcome(&self) -> &'static str {
        match self {
            AnalysisError::MissingApiKey => "missing_api_key",
            AnalysisError::InvalidApiKey => "invalid_api_key",
            AnalysisError::EmptyResponse => "empty_response",
            AnalysisError::RiskLevel(_) => "invalid_risk_level",
            AnalysisError::Failed(_) => "failed",
        }
    }
}

/// Multimodal service turning a photo and a location into findings.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &EvidenceImage,
        location: &str,
    ) -> std::result::Result<RawFindings, AnalysisError>;
}

/// Run one analysis for `session` and store the resulting report.
///
/// On success the new report becomes the selected one. On failure the
/// workflow keeps the image and records the message.
pub async fn submit(
    state: &AppState,
    session: &SessionHandle,
    location: &str,
) -> Result<ReportData> {
    let (user, image, location) = {
        let mut session = session.lock();
        if session.user.role.is_read_only() {
            return Err(ServerError::ReadOnlyRole(READ_ONLY_NOTICE));
        }

        let image = session.workflow.begin_submit(location)?;
        (session.user.clone(), image, location.trim().to_owned())
    };

    let guard = SubmitGuard::new(Arc::clone(session));
    let start = Instant::now();

    let result = state
        .analyzer
        .analyze(&image, &location)
        .await
        .and_then(|raw| {
            raw.into_findings(state.config.analysis.strict_risk_level)
                .map_err(AnalysisError::from)
        });

    let outcome = match &result {
        Ok(_) => "complete",
        Err(err) => err.outcome(),
    };
    metrics::counter!("analyses_total", "outcome" => outcome).increment(1);
    metrics::histogram!("analysis_duration_seconds")
        .record(start.elapsed().as_secs_f64());

    match result {
        Ok(findings) => {
            let date = state.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let report = state.reports.prepend(ReportData::from_findings(
                findings, location, date, image, user,
            ));

            {
                let mut session = session.lock();
                session.workflow.complete(report.id());
                session.navigator.select(report.id());
            }
            guard.disarm();

            Ok(report)
        },
        Err(err) => {
            tracing::warn!(user_id = user.id, error = %err, outcome, "analysis failed");
            session.lock().workflow.fail(err.to_string());
            guard.disarm();

            Err(err.into())
        },
    }
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Analyzer answering from memory.
    pub struct MockAnalyzer {
        risk_level: Option<String>,
        calls: AtomicUsize,
    }

    impl MockAnalyzer {
        pub fn returning(risk_level: &str) -> Self {
            Self {
                risk_level: Some(risk_level.to_owned()),
                calls: AtomicUsize::new(0),
            }
        }

        /// Always fails with an invalid key.
        pub fn failing() -> Self {
            Self {
                risk_level: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Analyzer for MockAnalyzer {
        async fn analyze(
            &self,
            _image: &EvidenceImage,
            location: &str,
        ) -> std::result::Result<RawFindings, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            match &self.risk_level {
                Some(risk_level) => Ok(RawFindings {
                    risk_level: risk_level.clone(),
                    anomaly_description: format!("Cables expuestos en {location}."),
                    ppe_recommendation: "Guantes dieléctricos.".into(),
                    infrastructure_suggestion: "Canalizar el cableado.".into(),
                    legal_reference: "Ley 19.587, Anexo IV, Capítulo 14.".into(),
                }),
                None => Err(AnalysisError::InvalidApiKey),
            }
        }
    }
}
