// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router assembly: `axum` routing plus the
//! `tower-http` tracing/CORS/body-limit middleware stack.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{chat, decisions, download, health, logs, reset, status, upload};
use crate::state::AppState;
use crate::ws::ws_upgrade;

/// Uploads are neurophysiology recordings; generous but bounded so a
/// malformed request can't exhaust disk.
const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_routes = Router::new()
        .route("/api/upload", post(upload::upload))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES));

    let api_routes = Router::new()
        .route("/api/start-conversion", post(chat::start_conversion))
        .route("/api/chat", post(chat::chat))
        .route("/api/retry-approval", post(decisions::retry_approval))
        .route("/api/improvement-decision", post(decisions::improvement_decision))
        .route("/api/status", get(status::status))
        .route("/api/logs", get(logs::logs))
        .route("/api/download/nwb", get(download::download_nwb))
        .route("/api/download/report", get(download::download_report_pdf))
        .route("/api/download/report.json", get(download::download_report_json))
        .route("/api/reset", post(reset::reset))
        .route("/api/health", get(health::health))
        .route("/ws", get(ws_upgrade));

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any).max_age(Duration::from_secs(3600));

    Router::new().merge(upload_routes).merge(api_routes).layer(cors).layer(TraceLayer::new_for_http()).with_state(state)
}
