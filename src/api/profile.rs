// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile read and update.

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    auth::Auth,
    error::{ApiError, Data},
    models::Profile,
    rate_limit::DEFAULT_MAX,
    state::AppState,
    validate::{sanitize_string, ValidationError},
};

/// Fields a client may write. Everything else in the payload is ignored.
const ALLOWED_PROFILE_FIELDS: &[&str] = &[
    "display_name",
    "avatar_url",
    "fitness_level",
    "goals",
    "preferences",
    "constraints",
];

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateResponse {
    pub updated: bool,
}

/// Fetch the caller's profile, or null when none exists yet.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Profile",
    responses(
        (status = 200, description = "Profile document or null", body = Profile),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Data<Option<Profile>>, ApiError> {
    state.limiter.check(Some(&identity.subject.0), DEFAULT_MAX)?;

    let profile = state.store.read().await.get_profile(&identity.subject);
    Ok(Data(profile))
}

fn apply_field(profile: &mut Profile, key: &str, value: &Value) {
    match key {
        "display_name" => profile.display_name = value.as_str().map(sanitize_string),
        "avatar_url" => profile.avatar_url = value.as_str().map(sanitize_string),
        "fitness_level" => profile.fitness_level = value.as_str().map(sanitize_string),
        "goals" => profile.goals = Some(value.clone()),
        "preferences" => profile.preferences = Some(value.clone()),
        "constraints" => profile.constraints = Some(value.clone()),
        _ => {}
    }
}

/// Merge allow-listed fields into the caller's profile.
#[utoipa::path(
    put,
    path = "/profile",
    tag = "Profile",
    responses(
        (status = 200, description = "Profile updated", body = UpdateResponse),
        (status = 400, description = "No valid fields to update"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Auth(identity): Auth,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Data<UpdateResponse>, ApiError> {
    state.limiter.check(Some(&identity.subject.0), DEFAULT_MAX)?;

    let Json(body) = body.map_err(|_| ValidationError::InvalidBody)?;
    let Some(map) = body.as_object() else {
        return Err(ValidationError::InvalidBody.into());
    };

    let mut store = state.store.write().await;
    let mut profile = store.get_profile(&identity.subject).unwrap_or_default();

    let mut applied = 0;
    for (key, value) in map {
        if ALLOWED_PROFILE_FIELDS.contains(&key.as_str()) {
            apply_field(&mut profile, key, value);
            applied += 1;
        }
    }

    if applied == 0 {
        return Err(ApiError::bad_request("No valid fields to update"));
    }

    store.put_profile(identity.subject, profile);
    Ok(Data(UpdateResponse { updated: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use axum::http::StatusCode;
    use serde_json::json;

    fn identity() -> Identity {
        Identity {
            subject: "user_1".into(),
            is_anonymous: true,
        }
    }

    #[tokio::test]
    async fn get_returns_null_for_new_identity() {
        let state = AppState::for_tests();
        let Data(profile) = get_profile(State(state), Auth(identity())).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn update_merges_allowed_fields() {
        let state = AppState::for_tests();
        let body = json!({
            "display_name": "Ada",
            "fitness_level": "beginner",
            "role": "admin"
        });

        let Data(result) = update_profile(State(state.clone()), Auth(identity()), Ok(Json(body)))
            .await
            .unwrap();
        assert!(result.updated);

        let Data(profile) = get_profile(State(state), Auth(identity())).await.unwrap();
        let profile = profile.unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
        assert_eq!(profile.fitness_level.as_deref(), Some("beginner"));
    }

    #[tokio::test]
    async fn update_preserves_fields_not_in_payload() {
        let state = AppState::for_tests();
        update_profile(
            State(state.clone()),
            Auth(identity()),
            Ok(Json(json!({"display_name": "Ada"}))),
        )
        .await
        .unwrap();
        update_profile(
            State(state.clone()),
            Auth(identity()),
            Ok(Json(json!({"goals": ["run a 10k"]}))),
        )
        .await
        .unwrap();

        let Data(profile) = get_profile(State(state), Auth(identity())).await.unwrap();
        let profile = profile.unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Ada"));
        assert_eq!(profile.goals, Some(json!(["run a 10k"])));
    }

    #[tokio::test]
    async fn update_rejects_payload_with_no_allowed_fields() {
        let state = AppState::for_tests();
        let err = update_profile(
            State(state),
            Auth(identity()),
            Ok(Json(json!({"role": "admin", "user_id": "someone_else"}))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "No valid fields to update");
    }

    #[tokio::test]
    async fn update_sanitizes_string_fields() {
        let state = AppState::for_tests();
        update_profile(
            State(state.clone()),
            Auth(identity()),
            Ok(Json(json!({"display_name": "<b>Ada</b>"}))),
        )
        .await
        .unwrap();

        let Data(profile) = get_profile(State(state), Auth(identity())).await.unwrap();
        assert_eq!(profile.unwrap().display_name.as_deref(), Some("bAda/b"));
    }
}
