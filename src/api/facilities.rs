// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Nearby-facilities search.
//!
//! The expensive part of this endpoint is the geo query, so identical
//! searches are deduplicated through the canonical-key cache. Cache failures
//! never fail the request.

use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::{
    auth::OptionalAuth,
    cache::canonical_key,
    error::{ApiError, Data},
    state::AppState,
    validate::{validate_coordinates, validate_number, NumberRules},
};

/// Activity types accepted as filters. Unknown values are dropped, not
/// rejected, so stale clients keep working after the vocabulary grows.
const ALLOWED_ACTIVITIES: &[&str] = &[
    "gym", "yoga", "pilates", "swimming", "crossfit", "boxing",
    "running", "cycling", "dance", "martial_arts", "tennis",
    "basketball", "soccer", "climbing", "hiking", "walking",
];

/// At most this many activity filters are honored per query.
const MAX_ACTIVITY_FILTERS: usize = 10;

const FACILITIES_RATE_LIMIT: u32 = 60;

const DEFAULT_RADIUS_M: u32 = 5000;

#[derive(Deserialize, IntoParams)]
pub struct FacilitiesQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// Comma-separated activity filters.
    pub activities: Option<String>,
    /// Search radius in meters, 100..=50000.
    pub radius: Option<String>,
}

/// Drop unknown activities, normalize case, and cap the filter count.
fn filter_activities(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(',')
        .map(|a| a.trim().to_ascii_lowercase())
        .filter(|a| ALLOWED_ACTIVITIES.contains(&a.as_str()))
        .take(MAX_ACTIVITY_FILTERS)
        .collect()
}

/// Search for facilities near a coordinate pair.
#[utoipa::path(
    get,
    path = "/facilities-nearby",
    params(FacilitiesQuery),
    tag = "Facilities",
    responses(
        (status = 200, description = "Facilities within the radius, closest first"),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn facilities_nearby(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    Query(params): Query<FacilitiesQuery>,
) -> Result<Data<Value>, ApiError> {
    let limit_key = identity.as_ref().map(|i| i.subject.0.as_str());
    state.limiter.check(limit_key, FACILITIES_RATE_LIMIT)?;

    let lat = params.lat.map(Value::String);
    let lng = params.lng.map(Value::String);
    let (lat, lng) = validate_coordinates(lat.as_ref(), lng.as_ref())?;

    let activities = filter_activities(params.activities.as_deref());

    let radius_value = params
        .radius
        .map(Value::String)
        .unwrap_or_else(|| Value::from(DEFAULT_RADIUS_M));
    let radius = validate_number(
        Some(&radius_value),
        "radius",
        &NumberRules {
            min: Some(100.0),
            max: Some(50_000.0),
            integer: true,
        },
    )? as u32;

    let cache_key = canonical_key(lat, lng, &activities, radius);
    if let Some(cached) = state.search_cache.lookup(&cache_key) {
        return Ok(Data(cached));
    }

    let matches = state
        .store
        .read()
        .await
        .search_facilities(lat, lng, &activities, f64::from(radius));
    let response = serde_json::to_value(&matches).map_err(ApiError::upstream)?;

    state.search_cache.store(&cache_key, response.clone());

    Ok(Data(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Facility;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn query(lat: &str, lng: &str, activities: Option<&str>, radius: Option<&str>) -> FacilitiesQuery {
        FacilitiesQuery {
            lat: Some(lat.to_string()),
            lng: Some(lng.to_string()),
            activities: activities.map(str::to_string),
            radius: radius.map(str::to_string),
        }
    }

    async fn seeded_state() -> AppState {
        let state = AppState::for_tests();
        state.store.write().await.load_facilities(vec![Facility {
            id: Uuid::new_v4(),
            name: "Covent Garden Gym".to_string(),
            lat: 51.5117,
            lng: -0.1240,
            activities: vec!["gym".to_string(), "crossfit".to_string()],
        }]);
        state
    }

    #[tokio::test]
    async fn returns_matches_for_valid_coordinates() {
        let state = seeded_state().await;
        let Data(response) = facilities_nearby(
            State(state),
            OptionalAuth(None),
            Query(query("51.5074", "-0.1278", None, None)),
        )
        .await
        .unwrap();

        let matches = response.as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["name"], "Covent Garden Gym");
        assert!(matches[0]["distance_m"].as_f64().unwrap() < 5000.0);
    }

    #[tokio::test]
    async fn rejects_out_of_range_latitude() {
        let state = seeded_state().await;
        let err = facilities_nearby(
            State(state),
            OptionalAuth(None),
            Query(query("91", "0", None, None)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("latitude"));
    }

    #[tokio::test]
    async fn rejects_missing_coordinates() {
        let state = seeded_state().await;
        let err = facilities_nearby(
            State(state),
            OptionalAuth(None),
            Query(FacilitiesQuery {
                lat: None,
                lng: None,
                activities: None,
                radius: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_out_of_range_radius() {
        let state = seeded_state().await;
        let err = facilities_nearby(
            State(state),
            OptionalAuth(None),
            Query(query("51.5074", "-0.1278", None, Some("99"))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("radius"));
    }

    #[tokio::test]
    async fn unknown_activities_are_dropped_not_rejected() {
        let state = seeded_state().await;
        let Data(response) = facilities_nearby(
            State(state),
            OptionalAuth(None),
            // "gym" survives the filter; "zorbing" is silently dropped.
            Query(query("51.5074", "-0.1278", Some("zorbing,gym"), None)),
        )
        .await
        .unwrap();
        assert_eq!(response.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_identical_query_is_served_from_cache() {
        let state = seeded_state().await;
        let params = || Query(query("51.50741", "-0.12781", Some("gym,crossfit"), None));

        let Data(first) =
            facilities_nearby(State(state.clone()), OptionalAuth(None), params())
                .await
                .unwrap();

        // Remove the facility; a cache hit still returns the original answer.
        state.store.write().await.load_facilities(Vec::new());

        // Sub-grid jitter and reordered filters canonicalize to the same key.
        let Data(second) = facilities_nearby(
            State(state),
            OptionalAuth(None),
            Query(query("51.50742", "-0.12779", Some("crossfit,gym"), None)),
        )
        .await
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn anonymous_burst_hits_the_shared_bucket() {
        let state = seeded_state().await;
        for _ in 0..crate::rate_limit::ANONYMOUS_MAX {
            facilities_nearby(
                State(state.clone()),
                OptionalAuth(None),
                Query(query("51.5074", "-0.1278", None, None)),
            )
            .await
            .unwrap();
        }
        let err = facilities_nearby(
            State(state),
            OptionalAuth(None),
            Query(query("51.5074", "-0.1278", None, None)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn activity_filter_normalizes_case_and_caps_count() {
        let raw = "GYM, Yoga ,unknown,pilates,swimming,crossfit,boxing,running,cycling,dance,tennis,hiking";
        let filtered = filter_activities(Some(raw));
        assert!(filtered.contains(&"gym".to_string()));
        assert!(filtered.contains(&"yoga".to_string()));
        assert!(!filtered.iter().any(|a| a == "unknown"));
        assert!(filtered.len() <= MAX_ACTIVITY_FILTERS);
    }
}
