// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-side credential representation.
//!
//! The token is an opaque bearer secret; the subject and expiry are read out
//! of its payload structurally, without signature verification; the client
//! only needs them to decide when a credential is worth presenting. The
//! server re-verifies everything.

use chrono::Utc;

use crate::auth::Claims;
use crate::models::AnonymousSession;

/// Credentials this close to expiry are treated as expired, so a call does
/// not start with a token that dies in flight.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential token is malformed")]
    Malformed,
}

/// An anonymous-identity bearer credential held by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    pub subject: String,
    pub expires_at: i64,
}

impl Credential {
    /// Reconstruct a credential from a persisted token string.
    pub fn parse(token: &str) -> Result<Self, CredentialError> {
        let token_data = jsonwebtoken::dangerous::insecure_decode::<Claims>(token)
            .map_err(|_| CredentialError::Malformed)?;

        Ok(Self {
            token: token.to_string(),
            subject: token_data.claims.sub,
            expires_at: token_data.claims.exp,
        })
    }

    /// Build a credential from a freshly issued session.
    pub fn from_session(session: &AnonymousSession) -> Self {
        Self {
            token: session.access_token.clone(),
            subject: session.user_id.0.clone(),
            expires_at: session.expires_at,
        }
    }

    /// The raw bearer token, for attaching to requests.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp() + EXPIRY_MARGIN_SECS
    }
}
