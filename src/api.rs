//! Application assembly.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::{AllowAll, AuthConfig, AuthError, CurrentSession, SessionReader, auth_routes};
use crate::config::AppConfig;
use crate::report::{ReportSettings, report_routes};

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: String,
}

/// `GET /api/hello`.
async fn hello(CurrentSession(session): CurrentSession) -> Json<HelloResponse> {
    let name = session
        .and_then(|s| s.user.name)
        .unwrap_or_else(|| "world".to_string());
    Json(HelloResponse {
        message: format!("Hello, {name}!"),
    })
}

/// Build the full API router from process configuration.
///
/// # Errors
///
/// Returns [`AuthError::Config`] if no session signing secret is configured.
pub fn app(config: &AppConfig) -> Result<Router, AuthError> {
    let auth = AuthConfig::from_app_config(config)?;
    let reader = SessionReader::from_config(&auth);

    let report = report_routes(ReportSettings {
        delay: config.report_delay,
        debug: config.debug,
    });

    Ok(Router::new()
        .route("/api/hello", get(hello))
        .with_state(reader)
        .merge(auth_routes(auth, AllowAll))
        .merge(report))
}
