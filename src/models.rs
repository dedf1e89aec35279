// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the domain data structures shared by the entry points
//! and the store. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Subject Id Type
//!
//! The [`SubjectId`] newtype wraps the identity backend's subject identifier
//! (the JWT `sub` claim). It provides type safety and clear semantics.
//!
//! ## Model Categories
//!
//! - **Facilities**: Fitness facilities returned by the nearby search
//! - **Profiles**: Per-identity profile documents
//! - **Questionnaire / Recommendations**: Onboarding answers and AI output
//! - **Events**: Analytics event records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// Subject Id Type
// =============================================================================

/// Identity subject identifier wrapper.
///
/// Wraps the `sub` claim of a verified credential. Anonymous and registered
/// identities use the same representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectId(pub String);

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        SubjectId(value)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        SubjectId(value.to_string())
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

// =============================================================================
// Facility Models
// =============================================================================

/// A fitness facility known to the directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Facility {
    /// Unique identifier for this facility.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Activity types offered (allow-listed vocabulary).
    pub activities: Vec<String>,
}

/// A facility matched by the nearby search, with its distance from the
/// query point.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FacilityMatch {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub activities: Vec<String>,
    /// Great-circle distance from the query point, in meters.
    pub distance_m: f64,
}

// =============================================================================
// Profile Models
// =============================================================================

/// Per-identity profile document.
///
/// Only the fields named by the profile entry point's allow-list are ever
/// written from client input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Value>,
}

// =============================================================================
// Questionnaire Models
// =============================================================================

/// A submitted onboarding questionnaire.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct QuestionnaireResponse {
    pub id: Uuid,
    pub user_id: SubjectId,
    /// Questionnaire script version the answers belong to.
    pub version: u32,
    /// Free-form answers document.
    pub responses: Value,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Recommendation Models
// =============================================================================

/// An AI-produced activity recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: SubjectId,
    /// Recommended activity types, allow-listed vocabulary.
    pub activity_types: Vec<String>,
    /// Model-written rationale shown to the user.
    pub reasoning: String,
    /// Input document the completion was generated from; reused on refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_input: Option<Value>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Event Models
// =============================================================================

/// An analytics event record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct EventRecord {
    pub id: Uuid,
    pub event_name: String,
    pub event_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    pub source: String,
    pub metadata: Value,
    /// Verified identity, when the caller presented a valid credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<SubjectId>,
    /// Client-generated install identifier; present on every event.
    pub anonymous_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Session Models
// =============================================================================

/// Session payload returned by `POST /auth/anonymous`.
///
/// The shape follows the hosted auth platform's session object so the client
/// treats both interchangeably.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AnonymousSession {
    /// Bearer credential for subsequent calls.
    pub access_token: String,
    pub token_type: String,
    /// Seconds until expiry.
    pub expires_in: i64,
    /// Absolute expiry, Unix seconds.
    pub expires_at: i64,
    /// Subject id embedded in the credential.
    pub user_id: SubjectId,
}
