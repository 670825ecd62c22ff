//! Error handler for guardian.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::analysis::AnalysisError;
use crate::analysis::workflow::WorkflowError;
use crate::export::ExportError;
use crate::navigation::View;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("error parsing form data")]
    ParsingForm(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("Credenciales incorrectas. Por favor, intente de nuevo.")]
    InvalidCredentials,

    #[error("El correo electrónico ya está registrado.")]
    EmailTaken,

    #[error("No puede eliminar su propia cuenta.")]
    SelfDeletion,

    #[error("view `{}` is not available for role {role}", view.as_str())]
    Forbidden {
        view: View,
        role: crate::model::HierarchicalRole,
    },

    #[error("{0}")]
    ReadOnlyRole(&'static str),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("invalid 'Authorization' header")]
    Unauthorized,
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Update `type` field.
    pub fn kind(mut self, kind: &str) -> Self {
        self.r#type = Some(kind.into());
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => response
                .details("Todos los campos son obligatorios.")
                .errors(validation_errors),

            ServerError::ParsingForm(err) => response
                .title("Server error during data parsing.")
                .details(&err.to_string()),

            ServerError::InvalidCredentials => response
                .title("Invalid credentials.")
                .kind("invalid_credentials")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Unauthorized => response
                .title("Missing or invalid 'Authorization' header.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::EmailTaken => response
                .title("Email already registered.")
                .kind("email_taken")
                .status(StatusCode::CONFLICT),

            ServerError::SelfDeletion => response
                .title("Action not allowed.")
                .kind("self_deletion")
                .status(StatusCode::FORBIDDEN),

            ServerError::Forbidden { .. } => response
                .title("Action not allowed.")
                .kind("forbidden_view")
                .status(StatusCode::FORBIDDEN),

            ServerError::ReadOnlyRole(_) => response
                .title("Action not allowed.")
                .kind("read_only_role")
                .status(StatusCode::FORBIDDEN),

            ServerError::NotFound(_) => {
                response.title("Not found.").status(StatusCode::NOT_FOUND)
            },

            ServerError::Workflow(err) => response
                .title("Analysis workflow rejected the request.")
                .kind(err.kind())
                .status(err.status()),

            ServerError::Analysis(err) => {
                tracing::warn!(error = %err, "analysis service failed");
                response
                    .title("Analysis service failed.")
                    .kind("analysis_failed")
                    .status(StatusCode::BAD_GATEWAY)
            },

            ServerError::Export(err) => {
                tracing::error!(error = %err, "report export failed");
                ResponseError::default().details(&err.to_string())
            },

            _ => response,
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
