// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity backend: anonymous credential issuance and verification.
//!
//! The original deployment delegated this to a hosted auth platform; here the
//! same surface lives in-process. Credentials are HS256 JWTs. Verification is
//! signature-first, then expiry, then a registry lookup; decoding alone
//! never authenticates.

use std::collections::HashSet;
use std::sync::RwLock;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::claims::{Claims, Identity};
use super::error::AuthError;
use crate::models::{AnonymousSession, SubjectId};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

pub struct IdentityService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
    /// Subjects this backend has issued and not deleted.
    subjects: RwLock<HashSet<String>>,
}

impl IdentityService {
    pub fn new(secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
            subjects: RwLock::new(HashSet::new()),
        }
    }

    /// Create a fresh anonymous identity and issue its credential.
    pub fn issue_anonymous(&self) -> Result<AnonymousSession, AuthError> {
        let subject = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        let expires_at = now + self.token_ttl_secs;

        let claims = Claims {
            sub: subject.clone(),
            iat: now,
            exp: expires_at,
            is_anonymous: true,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        write_unpoisoned(&self.subjects).insert(subject.clone());
        tracing::debug!(subject = %subject, "issued anonymous credential");

        Ok(AnonymousSession {
            access_token: token,
            token_type: "bearer".to_string(),
            expires_in: self.token_ttl_secs,
            expires_at,
            user_id: SubjectId(subject),
        })
    }

    /// Verify a bearer token and return the identity it proves.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        let claims = token_data.claims;

        let known = read_unpoisoned(&self.subjects).contains(&claims.sub);
        if !known {
            return Err(AuthError::UnknownSubject);
        }

        Ok(Identity {
            subject: SubjectId(claims.sub),
            is_anonymous: claims.is_anonymous,
        })
    }

    /// Remove a subject from the registry, invalidating every credential
    /// minted for it.
    pub fn delete_subject(&self, subject: &SubjectId) {
        write_unpoisoned(&self.subjects).remove(&subject.0);
    }
}

fn read_unpoisoned<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_unpoisoned<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_credentials_verify() {
        let identities = IdentityService::new("test-secret", 3600);
        let session = identities.issue_anonymous().unwrap();

        let identity = identities.verify(&session.access_token).unwrap();
        assert_eq!(identity.subject, session.user_id);
        assert!(identity.is_anonymous);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let ours = IdentityService::new("test-secret", 3600);
        let theirs = IdentityService::new("other-secret", 3600);
        let session = theirs.issue_anonymous().unwrap();

        assert_eq!(
            ours.verify(&session.access_token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn well_signed_token_for_unknown_subject_is_rejected() {
        // Same secret, separate registries: a decode-and-trust check would
        // accept this token.
        let issuer = IdentityService::new("shared-secret", 3600);
        let verifier = IdentityService::new("shared-secret", 3600);
        let session = issuer.issue_anonymous().unwrap();

        assert_eq!(
            verifier.verify(&session.access_token),
            Err(AuthError::UnknownSubject)
        );
    }

    #[test]
    fn expired_tokens_are_rejected() {
        // Negative TTL puts exp beyond the leeway in the past.
        let identities = IdentityService::new("test-secret", -120);
        let session = identities.issue_anonymous().unwrap();

        assert_eq!(
            identities.verify(&session.access_token),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn deleted_subjects_no_longer_verify() {
        let identities = IdentityService::new("test-secret", 3600);
        let session = identities.issue_anonymous().unwrap();
        identities.delete_subject(&session.user_id);

        assert_eq!(
            identities.verify(&session.access_token),
            Err(AuthError::UnknownSubject)
        );
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        let identities = IdentityService::new("test-secret", 3600);
        assert_eq!(
            identities.verify("not-a-jwt"),
            Err(AuthError::MalformedToken)
        );
    }
}
