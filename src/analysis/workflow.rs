//! Scan workflow of one session.

use axum::http::StatusCode;
use serde::Serialize;

use crate::model::{EvidenceImage, ImageSource};
use crate::session::SessionHandle;

pub const MISSING_INPUT: &str =
    "Por favor, suba una imagen e ingrese una ubicación.";

/// Explicit scan states. Only one analysis may be in flight per session.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Workflow {
    #[default]
    Idle,
    /// `last_error` holds why the previous attempt failed, if it did.
    ImageSelected {
        image: EvidenceImage,
        last_error: Option<String>,
    },
    Submitting {
        image: EvidenceImage,
        location: String,
    },
    Complete {
        report_id: String,
    },
}

/// Rejected transition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{}", MISSING_INPUT)]
    MissingInput,
    #[error("Ya hay un análisis en curso.")]
    Busy,
}

impl WorkflowError {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::MissingInput => "missing_input",
            WorkflowError::Busy => "analysis_in_progress",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WorkflowError::MissingInput => StatusCode::BAD_REQUEST,
            WorkflowError::Busy => StatusCode::CONFLICT,
        }
    }
}

impl Workflow {
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::Idle => "idle",
            Workflow::ImageSelected { .. } => "image-selected",
            Workflow::Submitting { .. } => "submitting",
            Workflow::Complete { .. } => "complete",
        }
    }

    pub fn image(&self) -> Option<&EvidenceImage> {
        match self {
            Workflow::ImageSelected { image, .. }
            | Workflow::Submitting { image, .. } => Some(image),
            Workflow::Idle | Workflow::Complete { .. } => None,
        }
    }

    /// Capture or upload. Replaces any previous image.
    pub fn select_image(
        &mut self,
        image: EvidenceImage,
    ) -> Result<(), WorkflowError> {
        if matches!(self, Workflow::Submitting { .. }) {
            return Err(WorkflowError::Busy);
        }

        *self = Workflow::ImageSelected {
            image,
            last_error: None,
        };
        Ok(())
    }

    pub fn clear_image(&mut self) -> Result<(), WorkflowError> {
        if matches!(self, Workflow::Submitting { .. }) {
            return Err(WorkflowError::Busy);
        }

        *self = Workflow::Idle;
        Ok(())
    }

    /// Enter `submitting`. Needs an image and a non-blank location;
    /// the state is left untouched otherwise.
    pub fn begin_submit(
        &mut self,
        location: &str,
    ) -> Result<EvidenceImage, WorkflowError> {
        let location = location.trim();

        let image = match self {
            Workflow::Submitting { .. } => return Err(WorkflowError::Busy),
            Workflow::ImageSelected { image, .. } if !location.is_empty() => {
                image.clone()
            },
            _ => return Err(WorkflowError::MissingInput),
        };

        *self = Workflow::Submitting {
            image: image.clone(),
            location: location.to_owned(),
        };
        Ok(image)
    }

    pub fn complete(&mut self, report_id: impl Into<String>) {
        *self = Workflow::Complete {
            report_id: report_id.into(),
        };
    }

    /// Back to `image-selected`, keeping the image and the reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if let Workflow::Submitting { image, .. } = self {
            *self = Workflow::ImageSelected {
                image: image.clone(),
                last_error: Some(reason.into()),
            };
        }
    }

    /// Undo an interrupted submission.
    pub fn abort(&mut self) {
        if let Workflow::Submitting { image, .. } = self {
            *self = Workflow::ImageSelected {
                image: image.clone(),
                last_error: None,
            };
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        let image = self.image().map(|image| ImageInfo {
            file_name: image.file_name.clone(),
            mime_type: image.mime_type.clone(),
            size: image.bytes.len(),
            source: image.source,
        });

        WorkflowStatus {
            state: self.name(),
            image,
            location: match self {
                Workflow::Submitting { location, .. } => Some(location.clone()),
                _ => None,
            },
            report_id: match self {
                Workflow::Complete { report_id } => Some(report_id.clone()),
                _ => None,
            },
            error: match self {
                Workflow::ImageSelected { last_error, .. } => last_error.clone(),
                _ => None,
            },
        }
    }
}

/// Serializable view of a [`Workflow`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    pub state: &'static str,
    pub image: Option<ImageInfo>,
    pub location: Option<String>,
    pub report_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
    pub source: ImageSource,
}

/// Puts the workflow back to `image-selected` if dropped while armed,
/// e.g. when the request is cancelled mid-analysis.
pub struct SubmitGuard {
    session: Option<SessionHandle>,
}

impl SubmitGuard {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn disarm(mut self) {
        self.session = None;
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::warn!("analysis interrupted, workflow reset");
            session.lock().workflow.abort();
        }
    }
}
