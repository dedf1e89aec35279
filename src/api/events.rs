// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Analytics event tracking.
//!
//! Accepts anonymous traffic; the rate-limit key is the client-generated
//! `anonymous_id`, so the minimal fields are validated before the limiter
//! runs.

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::OptionalAuth,
    error::{ApiError, Data},
    models::EventRecord,
    state::AppState,
    validate::{sanitize_string, validate_number, validate_string, NumberRules, StringRules, ValidationError},
};

/// Event names accepted for ingestion. Off-list names are rejected outright;
/// events are writes, unlike the activity filter where unknowns are dropped.
const ALLOWED_EVENT_NAMES: &[&str] = &[
    "page_view",
    "screen_view",
    "button_click",
    "form_submit",
    "onboarding_start",
    "onboarding_complete",
    "chat_message",
    "recommendation_view",
    "facility_view",
    "search",
    "error",
];

/// Events allowed per anonymous_id per window.
const EVENTS_RATE_LIMIT: u32 = 60;

/// Serialized metadata size ceiling, bytes.
const METADATA_MAX_BYTES: usize = 5000;

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub tracked: bool,
}

/// Ingest one analytics event.
#[utoipa::path(
    post,
    path = "/events-track",
    tag = "Events",
    responses(
        (status = 200, description = "Event recorded", body = TrackResponse),
        (status = 400, description = "Invalid event payload"),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn track_event(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Data<TrackResponse>, ApiError> {
    let Json(body) = body.map_err(|_| ValidationError::InvalidBody)?;

    let event_name = validate_string(
        body.get("event_name"),
        "event_name",
        &StringRules {
            max_len: Some(100),
            ..Default::default()
        },
    )?;
    let anonymous_id = validate_string(
        body.get("anonymous_id"),
        "anonymous_id",
        &StringRules {
            max_len: Some(100),
            ..Default::default()
        },
    )?;

    if !ALLOWED_EVENT_NAMES.contains(&event_name.as_str()) {
        return Err(ApiError::bad_request("Invalid event payload"));
    }

    state
        .limiter
        .check(Some(&anonymous_id), EVENTS_RATE_LIMIT)?;

    let event_version = match body.get("event_version").filter(|v| !v.is_null()) {
        Some(v) => validate_number(
            Some(v),
            "event_version",
            &NumberRules {
                min: Some(1.0),
                max: Some(100.0),
                integer: true,
            },
        )? as u32,
        None => 1,
    };

    let screen = match body.get("screen").filter(|v| !v.is_null()) {
        Some(v) => Some(sanitize_string(&validate_string(
            Some(v),
            "screen",
            &StringRules {
                max_len: Some(200),
                ..Default::default()
            },
        )?)),
        None => None,
    };

    let source = match body.get("source").filter(|v| !v.is_null()) {
        Some(v) => sanitize_string(&validate_string(
            Some(v),
            "source",
            &StringRules {
                max_len: Some(50),
                ..Default::default()
            },
        )?),
        None => "mobile".to_string(),
    };

    let metadata = match body.get("metadata") {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => Value::Object(Default::default()),
    };
    let metadata_len = serde_json::to_string(&metadata)
        .map(|s| s.len())
        .unwrap_or(usize::MAX);
    if metadata_len > METADATA_MAX_BYTES {
        return Err(ApiError::bad_request("Invalid event payload"));
    }

    let event = EventRecord {
        id: Uuid::new_v4(),
        event_name: sanitize_string(&event_name),
        event_version,
        screen,
        source,
        metadata,
        user_id: identity.map(|i| i.subject),
        anonymous_id: sanitize_string(&anonymous_id),
        created_at: Utc::now(),
    };

    state.store.write().await.record_event(event);

    Ok(Data(TrackResponse { tracked: true }))
}
