// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire envelope and error taxonomy.
//!
//! Every entry point answers with one of two shapes: `{"data": ...}` on
//! success or `{"error": <safe message>}` on failure, with an HTTP status
//! matching the error kind. Messages crossing the boundary come from the
//! allow-listed safe-message table or collapse to a generic fallback; the
//! original text is logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::rate_limit::RateLimitError;
use crate::validate::ValidationError;

/// Messages that may cross the boundary verbatim.
///
/// Everything else is replaced with [`GENERIC_MESSAGE`]. Validation and
/// rate-limit errors bypass this table: they are raised at the boundary and
/// carry only text the validator itself composed.
const SAFE_MESSAGES: &[&str] = &[
    "Invalid request body",
    "Invalid event payload",
    "No valid fields to update",
    "Missing AI input",
    "Unauthorized",
    "RATE_LIMIT_EXCEEDED",
    "Method not allowed",
];

const GENERIC_MESSAGE: &str = "Internal error";

/// Replace any message not on the safe list with the generic fallback.
///
/// Upstream failure text can carry credentials, file paths, or storage
/// vocabulary; the allow-list admits only fixed phrases, so none of it leaks.
pub fn sanitize_message(raw: &str) -> &str {
    if SAFE_MESSAGES.contains(&raw) {
        raw
    } else {
        GENERIC_MESSAGE
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Success envelope: wraps the payload as `{"data": <payload>}` with 200.
#[derive(Debug)]
pub struct Data<T>(pub T);

#[derive(Serialize)]
struct DataBody<T> {
    data: T,
}

impl<T: Serialize> IntoResponse for Data<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(DataBody { data: self.0 })).into_response()
    }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    /// Wrap a dependency failure (store, AI call) as a sanitized 500.
    ///
    /// Logs the original error; the response carries only a safe message.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        let raw = err.to_string();
        tracing::error!(error = %raw, "upstream dependency failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            sanitize_message(&raw).to_string(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<RateLimitError> for ApiError {
    fn from(_: RateLimitError) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let unauthorized = ApiError::unauthorized();
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);

        let mna = ApiError::method_not_allowed();
        assert_eq!(mna.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(mna.message, "Method not allowed");
    }

    #[tokio::test]
    async fn into_response_returns_error_envelope() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[tokio::test]
    async fn data_wraps_payload_in_envelope() {
        let response = Data(serde_json::json!({"id": "1"})).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["data"]["id"], "1");
    }

    #[test]
    fn sanitize_passes_safe_messages() {
        assert_eq!(
            sanitize_message("Invalid event payload"),
            "Invalid event payload"
        );
        assert_eq!(sanitize_message("Unauthorized"), "Unauthorized");
    }

    #[test]
    fn sanitize_collapses_unknown_messages() {
        assert_eq!(
            sanitize_message("select * from profiles failed: connection refused"),
            "Internal error"
        );
        assert_eq!(
            sanitize_message("Bearer eyJhbGciOiJIUzI1NiJ9.x.y rejected"),
            "Internal error"
        );
    }

    #[test]
    fn upstream_never_leaks_raw_text() {
        let err = ApiError::upstream("redb table recommendations missing");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal error");
    }
}
