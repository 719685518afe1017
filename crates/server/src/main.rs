// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process entry point: read configuration from the environment, wire
//! [`AppState`], and serve the `axum` router until shutdown. Exit codes: 0
//! on normal termination, nonzero on initialization
//! failure).

use nwb_server::{build_router, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let config = Config::from_env();

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize application state");
            return std::process::ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %config.bind_addr, "failed to bind listening socket");
            return std::process::ExitCode::FAILURE;
        }
    };

    tracing::info!(addr = %config.bind_addr, "nwb-server listening");

    let router = build_router(state);
    if let Err(err) = axum::serve(listener, router).await {
        tracing::error!(error = %err, "server terminated unexpectedly");
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
