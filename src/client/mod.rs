// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Gateway Client
//!
//! The mobile-side half of the system: session/credential management and the
//! authenticated call contract the UI links against.
//!
//! ## Call Flow
//!
//! 1. [`SessionManager`] supplies the active credential, establishing an
//!    anonymous one when none is valid
//! 2. [`GatewayClient::call`] attaches it as a bearer token plus the fixed
//!    platform `apikey` header
//! 3. A credential rejection triggers exactly one invalidate, re-establish,
//!    and retry cycle; every other failure maps to one [`GatewayError`]
//!
//! UI code receives typed results or typed errors, never a raw transport
//! exception or a raw credential.

pub mod credential;
pub mod gateway;
pub mod session;
pub mod store;

pub use credential::Credential;
pub use gateway::{GatewayClient, GatewayError};
pub use session::{SessionEvent, SessionManager};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

/// Normalize a base URL so relative joins append instead of replacing the
/// last path segment.
pub(crate) fn ensure_trailing_slash(mut url: url::Url) -> url::Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
