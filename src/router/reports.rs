//! Report history, detail, export and evidence.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get};
use axum::{Extension, Json, Router};

use crate::error::{Result, ServerError};
use crate::export;
use crate::model::{ReportData, ReportSummary};
use crate::screen::Screen;
use crate::session::CurrentSession;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /reports` goes to `list`.
        .route("/", get(list))
        // `DELETE /reports/selected` goes back to the history.
        .route("/selected", delete(back))
        .route("/{id}", get(select))
        .route("/{id}/pdf", get(pdf))
        .route("/{id}/image", get(image))
}

fn find(state: &AppState, current: &CurrentSession, id: &str) -> Result<ReportData> {
    let user = current.handle.lock().user.clone();
    state
        .reports
        .find_visible(&user, id)
        .ok_or_else(|| ServerError::NotFound(format!("report `{id}`")))
}

/// History filtered by role, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Json<Vec<ReportSummary>> {
    let user = current.handle.lock().user.clone();
    Json(
        state
            .reports
            .visible_to(&user)
            .iter()
            .map(ReportData::summary)
            .collect(),
    )
}

/// Select a report; the detail screen then overrides the active view.
pub async fn select(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Json<Screen>> {
    let report = find(&state, &current, &id)?;
    current.handle.lock().navigator.select(report.id());
    Ok(Json(Screen::report(report)))
}

/// Leave the detail screen.
pub async fn back(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Json<Screen> {
    let user = {
        let mut session = current.handle.lock();
        session.navigator.back();
        session.user.clone()
    };
    Json(Screen::history(&state.reports, &user))
}

/// Download the report as PDF.
pub async fn pdf(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Response> {
    let report = find(&state, &current, &id)?;
    let bytes = export::export(&state.http, &report, &state.config.export).await?;

    metrics::counter!("reports_exported_total").increment(1);
    tracing::info!(report_id = report.id(), size = bytes.len(), "report exported");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::file_name(&report)),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Evidence photo: bytes held in memory, or a redirect to the remote copy.
pub async fn image(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Response> {
    let report = find(&state, &current, &id)?;

    match report.evidence {
        Some(evidence) => Ok((
            [(header::CONTENT_TYPE, evidence.mime_type)],
            evidence.bytes,
        )
            .into_response()),
        None if report.image_url.starts_with("http") => {
            Ok(Redirect::temporary(&report.image_url).into_response())
        },
        None => Err(ServerError::NotFound(format!("image of report `{id}`"))),
    }
}
