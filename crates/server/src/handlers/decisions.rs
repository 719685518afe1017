// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /api/retry-approval` and `POST /api/improvement-decision`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Form;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RetryApprovalForm {
    decision: String,
}

pub async fn retry_approval(State(state): State<AppState>, Form(form): Form<RetryApprovalForm>) -> Result<impl IntoResponse, ApiError> {
    let approve = match form.decision.as_str() {
        "approve" => true,
        "decline" => false,
        other => return Err(ApiError::BadRequest(format!("decision must be `approve` or `decline`, got `{other}`"))),
    };
    let reply = state.dialogue.handle_retry_decision(approve).await?;
    Ok(Json(json!({ "message": reply.message, "status": reply.status, "ready_to_proceed": reply.ready_to_proceed })))
}

#[derive(Debug, Deserialize)]
pub struct ImprovementDecisionForm {
    decision: String,
}

pub async fn improvement_decision(
    State(state): State<AppState>,
    Form(form): Form<ImprovementDecisionForm>,
) -> Result<impl IntoResponse, ApiError> {
    let accept = match form.decision.as_str() {
        "accept" => true,
        "improve" => false,
        other => return Err(ApiError::BadRequest(format!("decision must be `accept` or `improve`, got `{other}`"))),
    };
    let reply = state.dialogue.handle_improvement_decision(accept).await?;
    Ok(Json(json!({ "message": reply.message, "status": reply.status, "ready_to_proceed": reply.ready_to_proceed })))
}
