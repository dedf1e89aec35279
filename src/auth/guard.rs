// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated identities.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is a verified Identity
//! }
//! ```
//!
//! `OptionalAuth` never rejects; endpoints that accept anonymous traffic use
//! it to attach an identity when one is present.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, Identity};
use crate::state::AppState;

/// Extractor that requires a verified identity.
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let identity = state.identities.verify(token.trim())?;

        Ok(Auth(identity))
    }
}

/// Extractor that attaches an identity when the request carries a valid
/// credential, and `None` otherwise. Never rejects.
pub struct OptionalAuth(pub Option<Identity>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(identity)) => Ok(OptionalAuth(Some(identity))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::Request;

    fn test_state() -> AppState {
        AppState::for_tests()
    }

    fn parts_with_header(value: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(v) = value {
            builder = builder.header("Authorization", v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_rejects_missing_header() {
        let state = test_state();
        let mut parts = parts_with_header(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_rejects_non_bearer_header() {
        let state = test_state();
        let mut parts = parts_with_header(Some("Basic dXNlcjpwYXNz".to_string()));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_accepts_issued_credentials() {
        let state = test_state();
        let session = state.identities.issue_anonymous().unwrap();
        let mut parts = parts_with_header(Some(format!("Bearer {}", session.access_token)));

        let result = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(result.0.subject, session.user_id);
    }

    #[tokio::test]
    async fn auth_rejects_forged_credentials() {
        let state = test_state();
        let other = crate::auth::IdentityService::new("not-the-secret", 3600);
        let session = other.issue_anonymous().unwrap();
        let mut parts = parts_with_header(Some(format!("Bearer {}", session.access_token)));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_credential() {
        let state = test_state();
        let mut parts = parts_with_header(None);

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(result.0.is_none());

        let mut parts = parts_with_header(Some("Bearer garbage".to_string()));
        let result = OptionalAuth::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(result.0.is_none());
    }
}
