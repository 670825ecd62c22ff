//! HTTP surface.
pub mod guides;
pub mod login;
pub mod reports;
pub mod scan;
pub mod session;
pub mod status;
pub mod users;

use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{Result, ServerError};
use crate::model::HierarchicalRole;
use crate::navigation::View;
use crate::session::CurrentSession;
use crate::AppState;

const BEARER: &str = "Bearer ";

/// JSON body checked with its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Resolve the bearer token into the caller's session.
pub async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix(BEARER))
        .map(|token| token.trim().to_owned())
        .ok_or(ServerError::Unauthorized)?;

    let handle = state
        .sessions
        .get(&token)
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut()
        .insert(CurrentSession { token, handle });
    Ok(next.run(req).await)
}

/// Restrict a router to the Director.
pub async fn director(
    Extension(current): Extension<CurrentSession>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let role = current.handle.lock().user.role;
    if role != HierarchicalRole::Director {
        return Err(ServerError::Forbidden {
            view: View::Users,
            role,
        });
    }

    Ok(next.run(req).await)
}

/// Refuse scan mutations for read-only roles.
pub(crate) fn ensure_writable(current: &CurrentSession) -> Result<()> {
    if current.handle.lock().user.role.is_read_only() {
        return Err(ServerError::ReadOnlyRole(
            crate::analysis::READ_ONLY_NOTICE,
        ));
    }
    Ok(())
}

/// State seeded with the bundled fixtures and a clock frozen at
/// 2024-08-01T12:00:00Z.
#[cfg(test)]
pub fn state(analyzer: std::sync::Arc<dyn crate::analysis::Analyzer>) -> AppState {
    use std::sync::Arc;

    use chrono::TimeZone;

    use crate::clock::{Clock, FixedClock};
    use crate::config::Configuration;
    use crate::report::{ReportStore, join};
    use crate::session::SessionStore;
    use crate::user::{UserRepository, UserService};

    let clock: Arc<dyn Clock> = Arc::new(FixedClock(
        chrono::Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap(),
    ));
    let users = crate::fixtures::users();
    let reports = join(crate::fixtures::reports(), &users);

    AppState {
        config: Arc::new(Configuration::default()),
        users: UserService::new(UserRepository::new(users)),
        reports: ReportStore::new(reports, Arc::clone(&clock)),
        sessions: SessionStore::default(),
        analyzer,
        clock,
        http: reqwest::Client::new(),
    }
}

/// Open a session for a fixture user, skipping `/login`.
#[cfg(test)]
pub fn login_as(state: &AppState, user_id: u64) -> String {
    let user = state
        .users
        .repo
        .find_by_id(user_id)
        .expect("unknown fixture user");
    state.sessions.open(user)
}
