//! Current session, menu and view switching.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::model::User;
use crate::navigation::{NavEntry, View, menu};
use crate::router::Valid;
use crate::screen::{self, Screen};
use crate::session::CurrentSession;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub user: User,
    pub view: View,
    pub selected_report: Option<String>,
    pub menu: Vec<NavEntry>,
}

fn describe(current: &CurrentSession) -> Response {
    let session = current.handle.lock();
    Response {
        user: session.user.clone(),
        view: session.navigator.active(),
        selected_report: session.navigator.selected().map(str::to_owned),
        menu: menu(session.user.role),
    }
}

pub async fn current(
    Extension(current): Extension<CurrentSession>,
) -> Json<Response> {
    Json(describe(&current))
}

/// Menu of the caller's role.
pub async fn navigation(
    Extension(current): Extension<CurrentSession>,
) -> Json<Vec<NavEntry>> {
    let role = current.handle.lock().user.role;
    Json(menu(role))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    pub view: View,
}

/// Switch view. Any selected report is dropped.
pub async fn navigate(
    Extension(current): Extension<CurrentSession>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    {
        let mut session = current.handle.lock();
        let role = session.user.role;
        session.navigator.navigate(body.view, role)?;
    }

    Ok(Json(describe(&current)))
}

/// Render whatever the session currently shows.
pub async fn view(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Json<Screen>> {
    let session = current.handle.lock();
    let screen = screen::render(&session, &state.reports, &state.users.repo)?;
    Ok(Json(screen))
}
