//! Login, logout and self registration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::model::{HierarchicalRole, User};
use crate::navigation::{NavEntry, View, landing_view, menu};
use crate::router::Valid;
use crate::session::CurrentSession;
use crate::user::UserBuilder;
use crate::AppState;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(min = 1, message = "Email is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub token_type: &'static str,
    pub token: String,
    pub user: User,
    pub view: View,
    pub menu: Vec<NavEntry>,
}

/// Handler to open a session.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = state.users.login(body.email.trim(), &body.password)?;
    let token = state.sessions.open(user.clone());

    Ok(Json(Response {
        token_type: TOKEN_TYPE,
        token,
        view: landing_view(user.role),
        menu: menu(user.role),
        user,
    }))
}

/// Handler to close the current session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> StatusCode {
    state.sessions.close(&current.token);
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "DNI is required."))]
    pub dni: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
    pub role: HierarchicalRole,
}

impl Registration {
    pub(crate) fn register(self, state: &AppState) -> Result<User> {
        let candidate = UserBuilder::new()
            .name(self.name.trim())
            .dni(self.dni.trim())
            .email(self.email)
            .password(self.password)
            .role(self.role)
            .build();

        state.users.register(candidate)
    }
}

/// Handler to create an account. Does not log in.
pub async fn register(
    State(state): State<AppState>,
    Valid(body): Valid<Registration>,
) -> Result<(StatusCode, Json<User>)> {
    let user = body.register(&state)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use crate::analysis::mock::MockAnalyzer;
    use crate::*;

    fn state() -> AppState {
        router::state(Arc::new(MockAnalyzer::returning("Verde")))
    }

    async fn json_body(response: axum::http::Response<axum::body::Body>) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_login_handler() {
        let state = state();
        let app = app(state.clone());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!({ "email": "dmartin@guardian.ia", "password": "123" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["tokenType"], "Bearer");
        assert_eq!(body["user"]["role"], "Autoridades");
        assert!(body["user"].get("password").is_none());
        assert_eq!(body["view"], "history");
        let menu: Vec<&str> = body["menu"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["view"].as_str().unwrap())
            .collect();
        assert_eq!(menu, ["history", "chemicals", "guide"]);

        let token = body["token"].as_str().unwrap();
        assert!(state.sessions.get(token).is_some());
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = app(state());

        let response = make_request(
            None,
            app,
            Method::POST,
            "/login",
            json!({ "email": "agarcia@guardian.ia", "password": "nope" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json_body(response).await;
        assert_eq!(
            body["detail"],
            "Credenciales incorrectas. Por favor, intente de nuevo."
        );
    }

    #[tokio::test]
    async fn test_logout_drops_session() {
        let state = state();
        let app = app(state.clone());
        let token = router::login_as(&state, 2);

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            "/logout",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response =
            make_request(Some(&token), app, Method::GET, "/session", String::default())
                .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_handler() {
        let state = state();
        let app = app(state.clone());
        let registration = json!({
            "name": "Marta Ruiz",
            "dni": "30.111.222",
            "email": "mruiz@guardian.ia",
            "password": "secreto",
            "role": "Personal de Servicio",
        });

        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/register",
            registration.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["id"], 6);
        assert_eq!(state.sessions.len(), 0);

        // Same email again.
        let response = make_request(
            None,
            app.clone(),
            Method::POST,
            "/register",
            registration.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(state.users.repo.list().len(), 6);

        // Missing fields.
        let response = make_request(
            None,
            app,
            Method::POST,
            "/register",
            json!({
                "name": "",
                "dni": "1",
                "email": "x@guardian.ia",
                "password": "1",
                "role": "Mayordomo",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Todos los campos son obligatorios.");
        assert_eq!(body["errors"][0]["field"], "name");
    }
}
