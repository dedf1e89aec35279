// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recommendation listing and AI refresh.

use axum::extract::State;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::{
    auth::Auth,
    error::{ApiError, Data},
    models::Recommendation,
    rate_limit::DEFAULT_MAX,
    state::AppState,
};

/// AI endpoints get a stricter ceiling than ordinary reads.
const AI_RATE_LIMIT: u32 = 10;

/// Stored recommendations younger than this are served without a model call.
const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Structured text the completion backend must return.
#[derive(Debug, Deserialize)]
struct CompletionPayload {
    activity_types: Vec<String>,
    reasoning: String,
}

/// List the caller's recommendations, newest first.
#[utoipa::path(
    get,
    path = "/recommendations",
    tag = "Recommendations",
    responses(
        (status = 200, description = "Recommendations, newest first", body = [Recommendation]),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn list_recommendations(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Data<Vec<Recommendation>>, ApiError> {
    state.limiter.check(Some(&identity.subject.0), DEFAULT_MAX)?;

    let list = state.store.read().await.list_recommendations(&identity.subject);
    Ok(Data(list))
}

/// Return a fresh recommendation, generating one through the completion
/// backend when the stored one is stale.
///
/// The stored `ai_input` document is reused as the model input; without one
/// there is nothing to generate from.
#[utoipa::path(
    post,
    path = "/recommendations/refresh",
    tag = "Recommendations",
    responses(
        (status = 200, description = "Current recommendation", body = Recommendation),
        (status = 400, description = "No AI input available"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn refresh_recommendation(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Data<Recommendation>, ApiError> {
    state.limiter.check(Some(&identity.subject.0), AI_RATE_LIMIT)?;

    let latest = state
        .store
        .read()
        .await
        .latest_recommendation(&identity.subject);

    if let Some(recommendation) = &latest {
        if Utc::now() - recommendation.created_at < Duration::hours(FRESHNESS_WINDOW_HOURS) {
            return Ok(Data(recommendation.clone()));
        }
    }

    let ai_input = latest
        .and_then(|rec| rec.ai_input)
        .ok_or_else(|| ApiError::bad_request("Missing AI input"))?;

    let text = state.model.complete(&ai_input).await.map_err(ApiError::upstream)?;
    let payload: CompletionPayload = serde_json::from_str(&text)
        .map_err(|e| ApiError::upstream(format!("completion was not valid JSON: {e}")))?;

    let recommendation = state.store.write().await.insert_recommendation(
        identity.subject,
        payload.activity_types,
        payload.reasoning,
        Some(ai_input),
    );

    Ok(Data(recommendation))
}
