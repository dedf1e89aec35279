// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and verified identity representation.

use serde::{Deserialize, Serialize};

use crate::models::SubjectId;

/// Claim set carried by gateway credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity id).
    pub sub: String,

    /// Issued at, Unix seconds.
    pub iat: i64,

    /// Expiry, Unix seconds.
    pub exp: i64,

    /// Whether the subject is a system-issued anonymous identity.
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Minimal identity value handed to entry points after verification.
///
/// This is all business logic ever sees; the raw credential stays inside the
/// auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: SubjectId,
    pub is_anonymous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip_through_json() {
        let claims = Claims {
            sub: "subject_1".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            is_anonymous: true,
        };
        let json = serde_json::to_string(&claims).unwrap();
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, "subject_1");
        assert!(back.is_anonymous);
    }

    #[test]
    fn is_anonymous_defaults_to_false() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"s","iat":0,"exp":1}"#).unwrap();
        assert!(!claims.is_anonymous);
    }
}
