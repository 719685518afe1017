// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /api/reset`: atomic session reset, refused while a
//! call is in flight (`StoreError::ResetWhileActive`).

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use nwb_core::SessionStatus;
use nwb_workers::dialogue::events::EventSink;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn reset(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.store.reset()?;
    state.events.status_change(SessionStatus::Idle);
    Ok(Json(json!({ "status": "idle" })))
}
