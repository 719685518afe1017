// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /api/upload`: multipart file + optional
//! `additional_files`, rejects a second primary upload while a conversion is
//! already in progress.

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use nwb_adapters::{format_tag_for_filename, sha256_file};
use nwb_core::SessionStatus;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let session = state.store.snapshot();
    if session.status != SessionStatus::Idle {
        return Err(ApiError::BadRequest("a session is already in progress; reset before uploading a new recording".to_string()));
    }

    let mut saved_path = None;
    let mut additional_filenames = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))? {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            // additional_files are accepted but not primary inputs; their
            // filenames are checked against the primary recording's format
            // below, and their bytes are drained without being kept.
            let filename = field.file_name().unwrap_or("").to_string();
            let _ = field.bytes().await;
            if !filename.is_empty() {
                additional_filenames.push(filename);
            }
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let dest = state.upload_dir.join(&filename);
        tokio::fs::write(&dest, &bytes).await.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        saved_path = Some((dest, bytes.len() as u64));
    }

    let (path, size_bytes) = saved_path.ok_or_else(|| ApiError::BadRequest("no `file` field present in the upload".to_string()))?;

    let primary_tag = path.file_name().and_then(|n| n.to_str()).and_then(format_tag_for_filename);
    if let Some(primary_tag) = primary_tag {
        for additional in &additional_filenames {
            if let Some(additional_tag) = format_tag_for_filename(additional) {
                if additional_tag != primary_tag {
                    let _ = tokio::fs::remove_file(&path).await;
                    return Err(ApiError::BadRequest(format!(
                        "additional file '{additional}' looks like {additional_tag} but the primary recording is {primary_tag}; uploads must share one format"
                    )));
                }
            }
        }
    }

    let checksum = sha256_file(&path).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let reply = state.dialogue.handle_upload(path.clone(), size_bytes).await?;

    Ok(Json(json!({
        "session_id": state.store.snapshot().id,
        "status": reply.status,
        "input_path": path.display().to_string(),
        "checksum": checksum,
        "message": reply.message,
    })))
}
