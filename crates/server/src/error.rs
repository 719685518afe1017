// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP boundary error mapping.
//!
//! Dialogue Worker exceptions are captured here and converted to a response;
//! the process never crashes on a conversion or validation failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use nwb_workers::DialogueError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
    #[error(transparent)]
    Store(#[from] nwb_core::StoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // A `Busy` store error reaching the HTTP boundary is not an
            // error — handlers normally intercept this
            // earlier via `HandleMessageOutcome::Busy`, but map it the same
            // way here as a defensive fallback.
            ApiError::Store(nwb_core::StoreError::Busy) => (StatusCode::OK, "busy".to_string()),
            ApiError::Dialogue(DialogueError::InvalidDecision(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Dialogue(DialogueError::Store(nwb_core::StoreError::TransitionRefused { from, to })) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("transition refused: {from} -> {to}"))
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };

        if status == StatusCode::OK {
            return (status, Json(json!({ "status": "busy", "message": "still thinking" }))).into_response();
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
