// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated gateway calls with transparent credential recovery.
//!
//! Every call runs as an explicit two-step state machine: an attempt yields
//! `Success`, `AuthRejected`, or `Failed`. The first rejection invalidates
//! the credential, establishes a fresh anonymous one, and retries the same
//! request exactly once; a second rejection surfaces as an error. The bound
//! is structural (a flag, not a counter loop), so no path retries twice or
//! duplicates side effects on non-idempotent calls.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use super::credential::Credential;
use super::ensure_trailing_slash;
use super::session::SessionManager;
use super::store::CredentialStore;

/// Fixed platform header attached to every request.
pub const API_KEY_HEADER: &str = "apikey";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest body excerpt carried inside an error.
const BODY_EXCERPT_CHARS: usize = 256;

/// Unified error surfaced to UI code.
///
/// Carries a status and message suitable for branching; the raw transport
/// error type never escapes this module.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The credential was rejected even after re-authentication.
    #[error("authentication failed (status {status})")]
    Unauthorized { status: u16 },

    /// Non-2xx response outside the handled credential-rejection case.
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// A successful status with a body that was not parseable JSON.
    #[error("invalid response format (status {status})")]
    InvalidResponse { status: u16 },

    /// The request never produced an HTTP response.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// No credential could be established.
    #[error("could not establish a session")]
    SessionUnavailable,
}

impl GatewayError {
    /// HTTP status, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Unauthorized { status }
            | GatewayError::Http { status, .. }
            | GatewayError::InvalidResponse { status } => Some(*status),
            GatewayError::Transport { .. } | GatewayError::SessionUnavailable => None,
        }
    }
}

/// Result of one attempt against the backend.
enum Outcome {
    Success(Value),
    AuthRejected(u16),
    Failed(GatewayError),
}

pub struct GatewayClient {
    http: Client,
    base_url: Url,
    api_key: String,
    session: Arc<SessionManager>,
}

impl GatewayClient {
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        let api_key = api_key.into();

        let session = Arc::new(SessionManager::with_client(
            http.clone(),
            base_url.clone(),
            api_key.clone(),
            store,
        ));

        Ok(Self {
            http,
            base_url: ensure_trailing_slash(base_url),
            api_key,
            session,
        })
    }

    /// The session manager driving this client's credentials.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Call a backend entry point under the active identity.
    ///
    /// `path` is relative to the base URL and may carry a query string.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, GatewayError> {
        let mut credential = match self.session.active_credential().await {
            Some(credential) => credential,
            None => self
                .session
                .establish_anonymous()
                .await
                .ok_or(GatewayError::SessionUnavailable)?,
        };

        let mut reauthenticated = false;
        loop {
            match self.attempt(&method, path, body, &credential).await {
                Outcome::Success(value) => {
                    return serde_json::from_value(value).map_err(|_| {
                        GatewayError::InvalidResponse {
                            status: StatusCode::OK.as_u16(),
                        }
                    })
                }
                Outcome::AuthRejected(status) => {
                    if reauthenticated {
                        // Second rejection: surface it, no further retries.
                        return Err(GatewayError::Unauthorized { status });
                    }
                    reauthenticated = true;
                    self.session.invalidate().await;
                    credential = self
                        .session
                        .establish_anonymous()
                        .await
                        .ok_or(GatewayError::SessionUnavailable)?;
                }
                Outcome::Failed(err) => return Err(err),
            }
        }
    }

    /// Fire one analytics event. Failures are swallowed entirely;
    /// tracking must never surface an error or block its caller.
    pub async fn track_event(
        &self,
        event_name: &str,
        anonymous_id: &str,
        screen: Option<&str>,
        metadata: Option<Value>,
    ) {
        let mut body = Map::new();
        body.insert("event_name".to_string(), Value::from(event_name));
        body.insert("anonymous_id".to_string(), Value::from(anonymous_id));
        if let Some(screen) = screen {
            body.insert("screen".to_string(), Value::from(screen));
        }
        if let Some(metadata) = metadata {
            body.insert("metadata".to_string(), metadata);
        }

        if let Err(err) = self
            .call::<Value>(Method::POST, "events-track", Some(&Value::Object(body)))
            .await
        {
            tracing::debug!(error = %err, event_name, "event tracking failed");
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        credential: &Credential,
    ) -> Outcome {
        let url = match self.base_url.join(path.trim_start_matches('/')) {
            Ok(url) => url,
            Err(err) => {
                return Outcome::Failed(GatewayError::Transport {
                    message: format!("invalid request path {path}: {err}"),
                })
            }
        };

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", credential.token()),
            )
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                return Outcome::Failed(GatewayError::Transport {
                    message: err.to_string(),
                })
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Outcome::AuthRejected(status.as_u16());
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                return Outcome::Failed(GatewayError::Transport {
                    message: err.to_string(),
                })
            }
        };

        if !status.is_success() {
            let message = if text.is_empty() {
                format!("API error ({})", status.as_u16())
            } else {
                format!("API error: {}", excerpt(&text))
            };
            return Outcome::Failed(GatewayError::Http {
                status: status.as_u16(),
                message,
            });
        }

        match unwrap_envelope(&text) {
            Some(value) => Outcome::Success(value),
            None => Outcome::Failed(GatewayError::InvalidResponse {
                status: status.as_u16(),
            }),
        }
    }
}

/// Wire envelope: `data` and `error` are the only discriminants.
struct Envelope<'a> {
    data: Option<&'a Value>,
    error: Option<&'a Value>,
}

/// Unwrap a successful response body.
///
/// An object carrying `data` and no `error` unwraps to the `data` field; any
/// other JSON passes through unchanged; an empty body reads as `{}`; and a
/// body that is not JSON at all is a protocol error (`None`).
fn unwrap_envelope(text: &str) -> Option<Value> {
    if text.is_empty() {
        return Some(Value::Object(Map::new()));
    }

    let raw: Value = serde_json::from_str(text).ok()?;

    if let Value::Object(map) = &raw {
        let envelope = Envelope {
            data: map.get("data"),
            error: map.get("error"),
        };
        return match (envelope.data, envelope.error) {
            (Some(data), None) => Some(data.clone()),
            // Carrying an error (or no data) despite a 2xx status: hand the
            // whole body to the caller rather than guess.
            (Some(_), Some(_)) | (None, Some(_)) | (None, None) => Some(raw.clone()),
        };
    }

    Some(raw)
}

fn excerpt(text: &str) -> String {
    text.chars().take(BODY_EXCERPT_CHARS).collect()
}
