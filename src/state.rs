// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state.
//!
//! The limiter and cache are injected instances rather than globals so tests
//! run against isolated state and a distributed implementation can be swapped
//! in without touching call sites.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::ai::{CompletionBackend, UnavailableCompletion};
use crate::auth::IdentityService;
use crate::cache::SearchCache;
use crate::rate_limit::RateLimiter;
use crate::store::DataStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<DataStore>>,
    pub identities: Arc<IdentityService>,
    pub limiter: Arc<RateLimiter>,
    pub search_cache: Arc<SearchCache>,
    pub model: Arc<dyn CompletionBackend>,
}

impl AppState {
    pub fn new(store: DataStore, identities: IdentityService) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            identities: Arc::new(identities),
            limiter: Arc::new(RateLimiter::new()),
            search_cache: Arc::new(SearchCache::default()),
            model: Arc::new(UnavailableCompletion),
        }
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Arc::new(limiter);
        self
    }

    pub fn with_search_cache(mut self, cache: SearchCache) -> Self {
        self.search_cache = Arc::new(cache);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn CompletionBackend>) -> Self {
        self.model = model;
        self
    }

    /// State wired with the development secret and empty tables.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::new(
            DataStore::new(),
            IdentityService::new(crate::config::DEV_JWT_SECRET, crate::config::DEFAULT_TOKEN_TTL_SECS),
        )
    }
}
