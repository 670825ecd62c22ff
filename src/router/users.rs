//! User management, Director only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Extension, Json, Router, middleware};

use crate::error::Result;
use crate::model::User;
use crate::router::login::Registration;
use crate::router::{Valid, director};
use crate::session::CurrentSession;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /users` lists, `POST /users` registers on someone's behalf.
        .route("/", get(list).post(create))
        // `DELETE /users/{id}` removes an account.
        .route("/{id}", delete(remove))
        .route_layer(middleware::from_fn(director))
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.users.repo.list())
}

pub async fn create(
    State(state): State<AppState>,
    Valid(body): Valid<Registration>,
) -> Result<(StatusCode, Json<User>)> {
    let user = body.register(&state)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Delete an account and close its sessions. Past reports keep their
/// author snapshot.
pub async fn remove(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    let caller = current.handle.lock().user.clone();
    state.users.delete(&caller, id)?;
    state.sessions.revoke_user(id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use crate::analysis::mock::MockAnalyzer;
    use crate::*;

    async fn json_body(response: axum::http::Response<axum::body::Body>) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_list_hides_passwords() {
        let state = router::state(Arc::new(MockAnalyzer::returning("Verde")));
        let app = app(state.clone());
        let token = router::login_as(&state, 1);

        let response =
            make_request(Some(&token), app, Method::GET, "/users", String::default())
                .await;
        let body = json_body(response).await;
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 5);
        assert!(users.iter().all(|user| user.get("password").is_none()));
    }

    #[tokio::test]
    async fn test_director_registers_user() {
        let state = router::state(Arc::new(MockAnalyzer::returning("Verde")));
        let app = app(state.clone());
        let token = router::login_as(&state, 1);

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            "/users",
            json!({
                "name": "Jorge Díaz",
                "dni": "33.444.555",
                "email": "jdiaz@guardian.ia",
                "password": "clave",
                "role": "Intendente",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["role"], "Intendente");

        let response = make_request(
            Some(&token),
            app,
            Method::POST,
            "/users",
            json!({
                "name": "Otra Persona",
                "dni": "1",
                "email": "cperez@guardian.ia",
                "password": "clave",
                "role": "Mayordomo",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            json_body(response).await["detail"],
            "El correo electrónico ya está registrado."
        );
    }

    #[tokio::test]
    async fn test_delete_user_revokes_sessions() {
        let state = router::state(Arc::new(MockAnalyzer::returning("Verde")));
        let app = app(state.clone());
        let director = router::login_as(&state, 1);
        let carlos = router::login_as(&state, 4);

        let response = make_request(
            Some(&director),
            app.clone(),
            Method::DELETE,
            "/users/4",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.users.repo.find_by_id(4).is_none());

        let response = make_request(
            Some(&carlos),
            app.clone(),
            Method::GET,
            "/session",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Their report survives with its snapshot.
        let response = make_request(
            Some(&director),
            app,
            Method::GET,
            "/reports/rep1",
            String::default(),
        )
        .await;
        assert_eq!(
            json_body(response).await["report"]["user"]["name"],
            "Carlos Perez"
        );
    }

    #[tokio::test]
    async fn test_self_deletion_is_refused() {
        let state = router::state(Arc::new(MockAnalyzer::returning("Verde")));
        let app = app(state.clone());
        let token = router::login_as(&state, 1);

        let response = make_request(
            Some(&token),
            app,
            Method::DELETE,
            "/users/1",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await["detail"],
            "No puede eliminar su propia cuenta."
        );
        assert_eq!(state.users.repo.list().len(), 5);
        assert!(state.sessions.get(&token).is_some());
    }
}
