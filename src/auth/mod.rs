// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Credential issuance and verification for the Dez gateway.
//!
//! ## Auth Flow
//!
//! 1. Client obtains an anonymous credential from `POST /auth/anonymous`
//! 2. Client sends `Authorization: Bearer <token>` on every call
//! 3. Gateway:
//!    - Verifies the HS256 signature, expiry, and structure
//!    - Confirms the subject still exists in the identity registry
//!    - Hands handlers a minimal [`Identity`], never the raw credential
//!
//! ## Security
//!
//! - Verification is signature-first plus a registry lookup, so a token that
//!   merely decodes (forged, stale, or minted against another environment's
//!   secret) never passes
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod guard;
pub mod service;

pub use claims::{Claims, Identity};
pub use error::AuthError;
pub use guard::{Auth, OptionalAuth};
pub use service::IdentityService;
