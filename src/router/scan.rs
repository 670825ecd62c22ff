//! Scan workflow: image selection and analysis submission.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::analysis::{self, workflow::WorkflowStatus};
use crate::error::{Result, ServerError};
use crate::model::{EvidenceImage, ImageSource};
use crate::router::{Valid, ensure_writable};
use crate::screen::Screen;
use crate::session::CurrentSession;
use crate::AppState;

const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;
const DEFAULT_FILE_NAME: &str = "evidencia";

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /scan` shows the workflow, `POST /scan` submits it.
        .route("/", get(show).post(submit))
        // `PUT /scan/image` selects, `DELETE /scan/image` discards.
        .route("/image", put(select_image).delete(clear_image))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
}

fn invalid_image() -> ServerError {
    let mut errors = ValidationErrors::new();
    errors.add(
        "image",
        ValidationError::new("image")
            .with_message("Seleccione una imagen válida.".into()),
    );
    errors.into()
}

/// Scan form state, or the notice shown to read-only roles.
pub async fn show(Extension(current): Extension<CurrentSession>) -> Json<Screen> {
    let session = current.handle.lock();
    Json(Screen::scan(&session))
}

/// Multipart upload with an `image` file and an optional `source`.
pub async fn select_image(
    Extension(current): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Result<Json<WorkflowStatus>> {
    ensure_writable(&current)?;

    let mut image = None;
    let mut source = ImageSource::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or_default()
                    .to_owned();
                let file_name = field
                    .file_name()
                    .unwrap_or(DEFAULT_FILE_NAME)
                    .to_owned();
                let bytes = field.bytes().await?;

                if !mime_type.starts_with("image/") || bytes.is_empty() {
                    return Err(invalid_image());
                }
                image = Some(EvidenceImage {
                    bytes,
                    mime_type,
                    file_name,
                    source: ImageSource::Upload,
                });
            },
            Some("source") => {
                let text = field.text().await?;
                source = serde_json::from_value(serde_json::Value::String(text))
                    .map_err(|err| ServerError::ParsingForm(Box::new(err)))?;
            },
            _ => {},
        }
    }

    let Some(mut image) = image else {
        return Err(invalid_image());
    };
    image.source = source;

    let mut session = current.handle.lock();
    session.workflow.select_image(image)?;
    tracing::debug!(user_id = session.user.id, ?source, "evidence selected");

    Ok(Json(session.workflow.status()))
}

pub async fn clear_image(
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<WorkflowStatus>> {
    ensure_writable(&current)?;

    let mut session = current.handle.lock();
    session.workflow.clear_image()?;
    Ok(Json(session.workflow.status()))
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct Body {
    #[serde(default)]
    pub location: String,
}

/// Analyse the selected image; answers with the new report.
pub async fn submit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Screen>)> {
    let report = analysis::submit(&state, &current.handle, &body.location).await?;
    Ok((StatusCode::CREATED, Json(Screen::report(report))))
}
