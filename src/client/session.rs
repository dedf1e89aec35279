// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session lifecycle for the anonymous identity.
//!
//! The manager owns the active credential. At most one credential is active
//! at a time; a stale one is discarded before a replacement is installed, so
//! concurrent callers never observe a half-updated session. Establishment
//! failures return `None` and leave prior state untouched; callers stay
//! unauthenticated rather than crash.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use url::Url;

use super::credential::Credential;
use super::ensure_trailing_slash;
use super::store::CredentialStore;
use crate::models::AnonymousSession;

/// External credential-change notification (login elsewhere, sign-out).
#[derive(Debug, Clone)]
pub enum SessionEvent {
    CredentialUpdated(String),
    SignedOut,
}

#[derive(Deserialize)]
struct SessionEnvelope {
    data: AnonymousSession,
}

pub struct SessionManager {
    http: Client,
    base_url: Url,
    api_key: String,
    store: Arc<dyn CredentialStore>,
    active: RwLock<Option<Credential>>,
}

impl SessionManager {
    pub fn with_client(
        http: Client,
        base_url: Url,
        api_key: impl Into<String>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            base_url: ensure_trailing_slash(base_url),
            api_key: api_key.into(),
            store,
            active: RwLock::new(None),
        }
    }

    /// The current credential: in-memory if unexpired, else restored from
    /// the durable store, else `None` (caller must establish one).
    pub async fn active_credential(&self) -> Option<Credential> {
        if let Some(credential) = self.active.read().await.clone() {
            if !credential.is_expired() {
                return Some(credential);
            }
        }

        let token = self.store.load()?;
        let credential = Credential::parse(&token).ok()?;
        if credential.is_expired() {
            return None;
        }

        *self.active.write().await = Some(credential.clone());
        Some(credential)
    }

    /// Request a new anonymous credential from the identity backend.
    ///
    /// On success the credential is persisted and made active. On any
    /// failure this returns `None` and prior state is untouched.
    pub async fn establish_anonymous(&self) -> Option<Credential> {
        let url = match self.base_url.join("auth/anonymous") {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = %err, "anonymous sign-in URL is invalid");
                return None;
            }
        };

        let response = match self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "anonymous sign-in request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "anonymous sign-in rejected");
            return None;
        }

        let envelope: SessionEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(error = %err, "anonymous sign-in response was invalid");
                return None;
            }
        };

        let credential = Credential::from_session(&envelope.data);
        self.persist(&credential).await;
        Some(credential)
    }

    /// Make `credential` the active one and mirror it into the durable
    /// store. Store failures are logged, not fatal: the session still works
    /// for this process lifetime.
    pub async fn persist(&self, credential: &Credential) {
        *self.active.write().await = Some(credential.clone());
        if let Err(err) = self.store.save(credential.token()) {
            tracing::warn!(error = %err, "failed to persist credential");
        }
    }

    /// Drop the active credential from memory and the durable store.
    ///
    /// Must run before a replacement credential is issued for the same
    /// failed session.
    pub async fn invalidate(&self) {
        *self.active.write().await = None;
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear persisted credential");
        }
    }

    /// Keep the durable copy in sync with external credential changes.
    ///
    /// Fire-and-forget: runs on a spawned task and never blocks the caller.
    pub fn spawn_change_listener(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::CredentialUpdated(token)) => {
                        match Credential::parse(&token) {
                            Ok(credential) => manager.persist(&credential).await,
                            Err(err) => {
                                tracing::warn!(error = %err, "ignoring unparseable credential update")
                            }
                        }
                    }
                    Ok(SessionEvent::SignedOut) => manager.invalidate().await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
