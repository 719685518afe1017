// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /api/logs?limit=N`.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

const DEFAULT_LOG_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    limit: Option<usize>,
}

pub async fn logs(State(state): State<AppState>, Query(query): Query<LogsQuery>) -> impl IntoResponse {
    let session = state.store.snapshot();
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let start = session.logs.len().saturating_sub(limit);

    Json(json!({ "logs": &session.logs[start..] }))
}
