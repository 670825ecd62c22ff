//! Guardián IA inspects workplace photos for hazards, keeps a role-gated
//! history of findings and exports them as PDF reports.

#![forbid(unsafe_code)]

pub mod analysis;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
mod fixtures;
pub mod model;
pub mod navigation;
pub mod report;
mod router;
pub mod screen;
pub mod session;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use analysis::{Analyzer, GeminiAnalyzer};
use clock::{Clock, SystemClock};
use config::Configuration;
use report::ReportStore;
use session::SessionStore;
use user::{UserRepository, UserService};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub users: UserService,
    pub reports: ReportStore,
    pub sessions: SessionStore,
    pub analyzer: Arc<dyn Analyzer>,
    pub clock: Arc<dyn Clock>,
    /// Shared client for outgoing calls.
    pub http: reqwest::Client,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Analyses are slow, the timeout comes from configuration.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.request_timeout),
        ))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let session_router = Router::new()
        .route("/logout", post(router::login::logout))
        .route("/session", get(router::session::current))
        .route(
            "/navigation",
            get(router::session::navigation).post(router::session::navigate),
        )
        .route("/view", get(router::session::view))
        .route("/chemicals", get(router::guides::chemicals))
        .route("/guide", get(router::guides::guide))
        .nest("/reports", router::reports::router())
        .nest("/scan", router::scan::router())
        .nest("/users", router::users::router())
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            router::auth,
        ));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `POST /login` opens a session.
        .route("/login", post(router::login::handler))
        // `POST /register` creates an account.
        .route("/register", post(router::login::register))
        .merge(session_router)
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state from a loaded configuration.
pub async fn initialize_state(
    config: Arc<Configuration>,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let fixtures = config.fixtures.clone().unwrap_or_default();
    let users = match fixtures.users {
        Some(ref path) => fixtures::load_users(path)?,
        None => {
            tracing::warn!("missing `fixtures.users` entry on `config.yaml` file");
            Vec::new()
        },
    };
    let reports = match fixtures.reports {
        Some(ref path) => report::join(fixtures::load_reports(path)?, &users),
        None => {
            tracing::warn!("missing `fixtures.reports` entry on `config.yaml` file");
            Vec::new()
        },
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("guardian/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let analyzer = GeminiAnalyzer::new(http.clone(), &config.analysis);
    if !analyzer.has_key() {
        tracing::warn!("no Gemini API key configured, analyses will fail");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    tracing::info!(
        users = users.len(),
        reports = reports.len(),
        "seed data ready"
    );

    Ok(AppState {
        users: UserService::new(UserRepository::new(users)),
        reports: ReportStore::new(reports, Arc::clone(&clock)),
        sessions: SessionStore::default(),
        analyzer: Arc::new(analyzer),
        clock,
        http,
        config,
    })
}
