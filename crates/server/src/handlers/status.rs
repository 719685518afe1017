// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /api/status`: the full snapshot projected into JSON,
//! with the conversation history and logs bounded to their most recent
//! entries so the response stays small on a long-running session.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Default tail length for `conversation_history`/`logs` in the status
/// projection; `GET /api/logs?limit=N` lets a caller ask for more.
const STATUS_HISTORY_TAIL: usize = 20;
const STATUS_LOG_TAIL: usize = 50;

fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    let start = items.len().saturating_sub(n);
    items[start..].to_vec()
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.store.snapshot();

    Json(json!({
        "session_id": session.id,
        "status": session.status,
        "phase": session.phase,
        "detected_format": session.detected_format,
        "validation_outcome": session.validation_outcome,
        "validation_status": session.validation_status,
        "input_path": session.input_path.map(|p| p.display().to_string()),
        "output_path": session.output_path.map(|p| p.display().to_string()),
        "output_checksum": session.output_checksum,
        "correction_attempt": session.correction_attempt,
        "can_retry": session.can_retry(),
        "active_processing": session.active_processing,
        "metadata_policy": session.metadata_policy,
        "user_metadata": session.user_metadata,
        "metadata_warnings": session.metadata_warnings,
        "conversation_history": tail(&session.conversation_history, STATUS_HISTORY_TAIL),
        "logs": tail(&session.logs, STATUS_LOG_TAIL),
    }))
}
