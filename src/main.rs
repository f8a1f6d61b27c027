// SPDX-License-Identifier: MIT

//! CRM API Server
//!
//! Serves registration, login, and refresh-token endpoints and gates the
//! protected resource routes behind JWT validation and role checks.

use crm_api::{config::Config, db::UserStore, services::TokenService, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment; a missing signing key aborts
    // startup here rather than failing per-request later.
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting CRM API");

    // Initialize the credential store and token issuer
    let users = UserStore::new();
    let tokens = TokenService::new(&config, users.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        users,
        tokens,
    });

    // Build router
    let app = crm_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("crm_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
