//! Response builders shared by the API handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::core::models::{AnalysisReport, DispatchOutcome};

pub const MISSING_PARAMETERS: &str = "Missing parameters";
pub const INVALID_JSON_BODY: &str = "Invalid JSON body";
pub const INVALID_LEVEL: &str = "Invalid level";
pub const ANALYSIS_FAILED: &str = "AI analysis failed";

/// An error answer: a status code and a JSON body carrying at least `error`.
#[derive(Debug)]
pub struct ApiError {
    pub status_code: StatusCode,
    pub body: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            body: json!({ "error": message }),
        }
    }

    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn internal(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub fn missing_parameters() -> Self {
        Self::bad_request(MISSING_PARAMETERS)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.body)).into_response()
    }
}

/// 500 for a provider that could not be reached, with the result the
/// service would otherwise have fallen back to.
#[must_use]
pub fn analysis_failed(detail: &str, fallback: &AnalysisReport) -> ApiError {
    ApiError {
        status_code: StatusCode::INTERNAL_SERVER_ERROR,
        body: json!({
            "error": ANALYSIS_FAILED,
            "detail": detail,
            "fallback": fallback,
        }),
    }
}

/// 200 `{status:"ok", result}`, plus `dispatch` when the push was awaited.
#[must_use]
pub fn ok_result(report: &AnalysisReport, dispatch: Option<&DispatchOutcome>) -> Json<Value> {
    let mut body = json!({ "status": "ok", "result": report });
    if let Some(outcome) = dispatch {
        body["dispatch"] = json!(outcome);
    }
    Json(body)
}

#[must_use]
pub fn ok_empty() -> Json<Value> {
    Json(json!({}))
}
