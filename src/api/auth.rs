// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Anonymous credential issuance.

use axum::extract::State;

use crate::{
    error::{ApiError, Data},
    models::AnonymousSession,
    rate_limit::DEFAULT_MAX,
    state::AppState,
};

/// Issue a fresh anonymous identity and its credential.
///
/// Unauthenticated by definition, so the request is limited under the shared
/// anonymous bucket.
#[utoipa::path(
    post,
    path = "/auth/anonymous",
    tag = "Auth",
    responses(
        (status = 200, description = "New anonymous session", body = AnonymousSession),
        (status = 429, description = "Rate limited"),
    )
)]
pub async fn anonymous_sign_in(
    State(state): State<AppState>,
) -> Result<Data<AnonymousSession>, ApiError> {
    state.limiter.check(None, DEFAULT_MAX)?;

    let session = state
        .identities
        .issue_anonymous()
        .map_err(ApiError::upstream)?;

    Ok(Data(session))
}
