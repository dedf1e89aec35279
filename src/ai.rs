// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Seam for the external AI completion call.
//!
//! The recommendation refresh flow hands a stored input document to a
//! [`CompletionBackend`] and expects structured text back. The call itself is
//! an external dependency; this module defines the boundary and the stand-in
//! implementations used in development and tests.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion backend is not configured")]
    NotConfigured,

    #[error("completion request failed: {0}")]
    Request(String),

    #[error("completion response was invalid: {0}")]
    InvalidResponse(String),
}

pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;

/// An external model that turns a recommendation input document into
/// structured text (a JSON object with `activity_types` and `reasoning`).
pub trait CompletionBackend: Send + Sync {
    fn complete<'a>(&'a self, input: &'a Value) -> CompletionFuture<'a>;
}

/// Backend that always fails; the default when no model is wired up.
pub struct UnavailableCompletion;

impl CompletionBackend for UnavailableCompletion {
    fn complete<'a>(&'a self, _input: &'a Value) -> CompletionFuture<'a> {
        Box::pin(async { Err(CompletionError::NotConfigured) })
    }
}

/// Backend that returns a fixed completion. Used by tests and local demos.
pub struct StaticCompletion {
    text: String,
}

impl StaticCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl CompletionBackend for StaticCompletion {
    fn complete<'a>(&'a self, _input: &'a Value) -> CompletionFuture<'a> {
        Box::pin(async move { Ok(self.text.clone()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn static_backend_returns_its_text() {
        let backend = StaticCompletion::new(r#"{"activity_types":["yoga"],"reasoning":"calm"}"#);
        let text = backend.complete(&json!({})).await.unwrap();
        assert!(text.contains("yoga"));
    }

    #[tokio::test]
    async fn unavailable_backend_errors() {
        let backend = UnavailableCompletion;
        assert!(matches!(
            backend.complete(&json!({})).await,
            Err(CompletionError::NotConfigured)
        ));
    }
}
