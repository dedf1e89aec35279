// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use dez_gateway::auth::IdentityService;
use dez_gateway::models::Facility;
use dez_gateway::state::AppState;
use dez_gateway::store::DataStore;
use dez_gateway::{api, config};

#[tokio::main]
async fn main() {
    init_tracing();

    let secret = config::env_or_default(config::JWT_SECRET_ENV, config::DEV_JWT_SECRET);
    if secret == config::DEV_JWT_SECRET {
        tracing::warn!(
            "{} not set; using the development signing secret",
            config::JWT_SECRET_ENV
        );
    }
    let token_ttl = config::env_optional(config::TOKEN_TTL_ENV)
        .and_then(|v| v.parse().ok())
        .unwrap_or(config::DEFAULT_TOKEN_TTL_SECS);

    let mut store = DataStore::new();
    if let Some(path) = config::env_optional(config::FACILITIES_SEED_ENV) {
        match load_facilities(&path) {
            Ok(facilities) => {
                tracing::info!(count = facilities.len(), path, "loaded facilities seed");
                store.load_facilities(facilities);
            }
            Err(err) => tracing::warn!(error = %err, path, "failed to load facilities seed"),
        }
    }

    let state = AppState::new(store, IdentityService::new(&secret, token_ttl));
    let app = api::router(state);

    let host = config::env_or_default("HOST", "0.0.0.0");
    let port: u16 = config::env_or_default("PORT", "8080").parse().unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Dez gateway listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    match config::env_or_default("LOG_FORMAT", "pretty").as_str() {
        "json" => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install shutdown signal handler");
        return;
    }
    tracing::info!("shutdown signal received");
}

fn load_facilities(path: &str) -> Result<Vec<Facility>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
