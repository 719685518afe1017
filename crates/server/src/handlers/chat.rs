// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /api/start-conversion` and `POST /api/chat`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Form;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use nwb_workers::HandleMessageOutcome;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn start_conversion(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let reply = state.dialogue.handle_start_conversion().await?;
    Ok(Json(json!({ "status": reply.status, "message": reply.message })))
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    message: String,
}

pub async fn chat(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Result<impl IntoResponse, ApiError> {
    match state.dialogue.handle_user_message(&form.message).await? {
        HandleMessageOutcome::Busy => Ok(Json(json!({ "status": "busy", "message": "still thinking" }))),
        HandleMessageOutcome::Reply(reply) => Ok(Json(json!({
            "message": reply.message,
            "status": reply.status,
            "ready_to_proceed": reply.ready_to_proceed,
            "needs_more_info": reply.needs_more_info,
            "extracted_metadata": reply.extracted_metadata,
        }))),
    }
}
