// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP entry points.
//!
//! Every capability composes the same pipeline: auth guard, rate limiter,
//! validation, then cache or business logic, answered through the
//! `{data}`/`{error}` envelope. CORS preflight is handled by the layer before
//! any handler runs; the origin allow-list comes from configuration.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config,
    error::ApiError,
    models::{
        AnonymousSession, EventRecord, Facility, FacilityMatch, Profile, QuestionnaireResponse,
        Recommendation, SubjectId,
    },
    state::AppState,
};

pub mod auth;
pub mod events;
pub mod facilities;
pub mod health;
pub mod profile;
pub mod questionnaire;
pub mod recommendations;

/// Envelope-shaped 405 for routes hit with an unsupported method.
async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route(
            "/auth/anonymous",
            post(auth::anonymous_sign_in).fallback(method_not_allowed),
        )
        .route(
            "/facilities-nearby",
            get(facilities::facilities_nearby).fallback(method_not_allowed),
        )
        .route(
            "/questionnaire-submit",
            post(questionnaire::submit_questionnaire).fallback(method_not_allowed),
        )
        .route(
            "/recommendations",
            get(recommendations::list_recommendations).fallback(method_not_allowed),
        )
        .route(
            "/recommendations/refresh",
            post(recommendations::refresh_recommendation).fallback(method_not_allowed),
        )
        .route(
            "/profile",
            get(profile::get_profile)
                .put(profile::update_profile)
                .fallback(method_not_allowed),
        )
        .route(
            "/events-track",
            post(events::track_event).fallback(method_not_allowed),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer()),
        )
}

/// CORS policy from the `ALLOWED_ORIGINS` allow-list.
///
/// With no configured origins the policy is permissive, which is only
/// acceptable for development.
fn cors_layer() -> CorsLayer {
    match config::env_optional(config::ALLOWED_ORIGINS_ENV) {
        Some(origins) => {
            let list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(list))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::HeaderName::from_static("apikey"),
                    header::HeaderName::from_static("x-client-info"),
                ])
                .max_age(Duration::from_secs(86400))
        }
        None => CorsLayer::permissive(),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::anonymous_sign_in,
        facilities::facilities_nearby,
        questionnaire::submit_questionnaire,
        recommendations::list_recommendations,
        recommendations::refresh_recommendation,
        profile::get_profile,
        profile::update_profile,
        events::track_event,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            AnonymousSession,
            SubjectId,
            Facility,
            FacilityMatch,
            Profile,
            QuestionnaireResponse,
            Recommendation,
            EventRecord,
            questionnaire::SubmitResponse,
            profile::UpdateResponse,
            events::TrackResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Anonymous credential issuance"),
        (name = "Facilities", description = "Nearby facility search"),
        (name = "Questionnaire", description = "Onboarding questionnaire submission"),
        (name = "Recommendations", description = "Activity recommendations"),
        (name = "Profile", description = "Profile management"),
        (name = "Events", description = "Analytics event tracking"),
        (name = "Health", description = "Service probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::for_tests());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn unsupported_method_gets_a_405_envelope() {
        let app = router(AppState::for_tests());
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/events-track")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 405);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn cors_preflight_is_answered_before_handlers() {
        let app = router(AppState::for_tests());
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/events-track")
                    .header("Origin", "https://app.example.com")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Preflight never reaches the 405 method fallback.
        assert!(response.status().is_success());
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn protected_route_rejects_missing_credentials_with_envelope() {
        let app = router(AppState::for_tests());
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/profile")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn requests_get_a_request_id() {
        let app = router(AppState::for_tests());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}
