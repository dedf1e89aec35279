// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Questionnaire submission.

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    auth::Auth,
    error::{ApiError, Data},
    rate_limit::DEFAULT_MAX,
    state::AppState,
    validate::{require_fields, validate_number, NumberRules, ValidationError},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub submitted: bool,
}

/// Record a completed onboarding questionnaire for the caller's identity.
#[utoipa::path(
    post,
    path = "/questionnaire-submit",
    tag = "Questionnaire",
    responses(
        (status = 200, description = "Submission recorded", body = SubmitResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn submit_questionnaire(
    State(state): State<AppState>,
    Auth(identity): Auth,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Data<SubmitResponse>, ApiError> {
    state.limiter.check(Some(&identity.subject.0), DEFAULT_MAX)?;

    let Json(body) = body.map_err(|_| ValidationError::InvalidBody)?;
    require_fields(&body, &["version", "responses"])?;

    let version = validate_number(
        body.get("version"),
        "version",
        &NumberRules {
            min: Some(1.0),
            max: Some(1000.0),
            integer: true,
        },
    )? as u32;

    let responses = match body.get("responses") {
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map.clone()),
        _ => {
            return Err(ValidationError::InvalidFormat {
                field: "responses",
            }
            .into())
        }
    };

    state
        .store
        .write()
        .await
        .insert_questionnaire(identity.subject, version, responses);

    Ok(Data(SubmitResponse { submitted: true }))
}
