//! Scam report intake.
//!
//! Reports are validated, logged and acknowledged. Nothing is stored and
//! nobody is notified.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::types::ReportId;

/// A report that passed validation.
///
/// Only `description` is checked. The remaining fields are read leniently:
/// a value of the wrong type counts as absent.
#[derive(Debug, Clone)]
pub struct Report {
    pub description: String,
    pub is_anonymous: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub scam_type: Option<String>,
    pub scam_method: Option<String>,
    pub submitted_at: OffsetDateTime,
}

impl TryFrom<&Value> for Report {
    type Error = ReportError;

    fn try_from(body: &Value) -> Result<Self, Self::Error> {
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_owned);

        let description = text("description")
            .filter(|d| !d.trim().is_empty())
            .ok_or(ReportError::MissingDescription)?;

        let submitted_at = text("submittedAt")
            .and_then(|s| OffsetDateTime::parse(&s, &Rfc3339).ok())
            .unwrap_or_else(OffsetDateTime::now_utc);

        Ok(Self {
            description,
            is_anonymous: body
                .get("isAnonymous")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            name: text("name"),
            email: text("email"),
            phone: text("phone"),
            scam_type: text("scamType"),
            scam_method: text("scamMethod"),
            submitted_at,
        })
    }
}

/// Successful acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportReceipt {
    pub success: bool,
    pub message: String,
    pub report_id: ReportId,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Description is required")]
    MissingDescription,

    #[error("Failed to process report: {0}")]
    Processing(String),
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingDescription => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() })))
                    .into_response()
            }
            Self::Processing(ref detail) => {
                tracing::error!(error = %detail, "Report submission failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to submit report. Please try again later." })),
                )
                    .into_response()
            }
        }
    }
}

/// Report intake settings.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Simulated downstream latency before acknowledging.
    pub delay: Duration,
    /// Log contact details and full text (development only).
    pub debug: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            debug: false,
        }
    }
}

/// `POST /api/report`.
pub fn report_routes(settings: ReportSettings) -> Router {
    Router::new()
        .route("/api/report", post(submit_report))
        .with_state(Arc::new(settings))
}

async fn submit_report(
    State(settings): State<Arc<ReportSettings>>,
    body: Bytes,
) -> Result<Json<ReportReceipt>, ReportError> {
    let body: Value =
        serde_json::from_slice(&body).map_err(|e| ReportError::Processing(e.to_string()))?;
    let report = Report::try_from(&body)?;

    tokio::time::sleep(settings.delay).await;

    let report_id = ReportId::generate();
    tracing::info!(
        report_id = %report_id,
        scam_type = report.scam_type.as_deref().unwrap_or("unspecified"),
        scam_method = report.scam_method.as_deref().unwrap_or("unspecified"),
        anonymous = report.is_anonymous,
        submitted_at = %report.submitted_at,
        "Scam report received"
    );
    if settings.debug {
        tracing::debug!(
            report_id = %report_id,
            description = %report.description,
            name = ?report.name,
            email = ?report.email,
            phone = ?report.phone,
            "Scam report details"
        );
    }

    Ok(Json(ReportReceipt {
        success: true,
        message: "Report submitted successfully. Thank you for helping protect others.".into(),
        report_id,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header::CONTENT_TYPE};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        report_routes(ReportSettings {
            delay: Duration::ZERO,
            debug: true,
        })
    }

    async fn submit(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::post("/api/report")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn valid_report_is_acknowledged() {
        let (status, body) = submit(app(), r#"{"description": "scam happened"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(!body["message"].as_str().unwrap().is_empty());
        let id = body["reportId"].as_str().unwrap();
        assert!(id.starts_with("RPT-"));
    }

    #[tokio::test]
    async fn full_report_is_accepted() {
        let (status, body) = submit(
            app(),
            r#"{
                "description": "Caller pretended to be my grandson",
                "isAnonymous": false,
                "name": "Kim",
                "email": "kim@example.com",
                "phone": "010-0000-0000",
                "scamType": "impersonation",
                "scamMethod": "phone",
                "submittedAt": "2026-10-18T09:00:00Z"
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn blank_or_missing_description_is_bad_request() {
        for body in [
            r#"{"description": "  "}"#,
            r#"{"description": ""}"#,
            r#"{}"#,
            r#"{"description": 42}"#,
            "[1, 2]",
        ] {
            let (status, json) = submit(app(), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json["error"], "Description is required");
        }
    }

    #[tokio::test]
    async fn malformed_body_is_server_error() {
        for body in ["not json", "", r#"{"description": "cut off"#] {
            let (status, json) = submit(app(), body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn mistyped_optional_fields_do_not_reject_report() {
        for body in [
            r#"{"description": "scam happened", "isAnonymous": "true"}"#,
            r#"{"description": "scam happened", "isAnonymous": null}"#,
            r#"{"description": "scam happened", "phone": 1012345678}"#,
            r#"{"description": "scam happened", "submittedAt": "Sat Oct 18 2026"}"#,
            r#"{"description": "scam happened", "name": ["Kim"], "scamType": {}}"#,
        ] {
            let (status, json) = submit(app(), body).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(json["success"], true, "{body}");
        }
    }

    #[test]
    fn mistyped_fields_read_as_absent() {
        let body = serde_json::json!({
            "description": "x",
            "isAnonymous": "true",
            "phone": 1012345678,
            "email": "kim@example.com",
        });
        let report = Report::try_from(&body).unwrap();
        assert!(!report.is_anonymous);
        assert!(report.phone.is_none());
        assert_eq!(report.email.as_deref(), Some("kim@example.com"));
    }

    #[tokio::test]
    async fn concurrent_reports_get_distinct_ids() {
        let app = report_routes(ReportSettings {
            delay: Duration::from_millis(20),
            debug: false,
        });
        let (a, b) = tokio::join!(
            submit(app.clone(), r#"{"description": "first"}"#),
            submit(app.clone(), r#"{"description": "second"}"#),
        );
        assert_eq!(a.0, StatusCode::OK);
        assert_eq!(b.0, StatusCode::OK);
        assert_ne!(a.1["reportId"], b.1["reportId"]);
    }

    #[test]
    fn validated_report_defaults_submission_time() {
        let body = serde_json::json!({ "description": "x", "isAnonymous": true });
        let report = Report::try_from(&body).unwrap();
        assert!(report.is_anonymous);
        assert!(report.submitted_at <= OffsetDateTime::now_utc());

        let body = serde_json::json!({
            "description": "x",
            "submittedAt": "2026-10-18T09:00:00Z",
        });
        let report = Report::try_from(&body).unwrap();
        assert_eq!(report.submitted_at.unix_timestamp(), 1_792_314_000);
    }
}
