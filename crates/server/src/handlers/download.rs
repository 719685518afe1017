// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /api/download/{nwb,report,report.json}`. Handlers
//! stream from disk directly rather than via `ServeDir` so the checksum and
//! session-scoped path can be validated before any bytes go out.

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;

use nwb_report::model::ReportContext;

use crate::error::ApiError;
use crate::state::AppState;

async fn stream_file(path: &std::path::Path, content_type: &str, download_name: &str) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| ApiError::NotFound(e.to_string()))?;
    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{download_name}\""))
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn download_nwb(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let session = state.store.snapshot();
    let path = session.output_path.ok_or_else(|| ApiError::NotFound("no output file has been produced yet".to_string()))?;
    let name = path.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_else(|| "output.nwb".to_string());
    stream_file(&path, "application/octet-stream", &name).await
}

fn report_context(state: &AppState) -> Result<ReportContext, ApiError> {
    let session = state.store.snapshot();
    let report = session.validation_report.clone().ok_or_else(|| ApiError::NotFound("no validation report is available yet".to_string()))?;
    let nwb_path = session.output_path.clone().unwrap_or_default();
    Ok(ReportContext {
        session_id: session.id.to_string(),
        nwb_path,
        nwb_checksum: session.output_checksum.clone().unwrap_or_default(),
        validation_status: session.validation_status.map(|s| s.to_string()),
        report,
        user_metadata: session.user_metadata.clone(),
        metadata_warnings: session.metadata_warnings.clone(),
        generated_at_ms: state.store.epoch_ms(),
    })
}

pub async fn download_report_pdf(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = report_context(&state)?;
    let bytes = nwb_report::pdf::render(&ctx).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}_validation_report.pdf\"", ctx.session_id))
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn download_report_json(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = report_context(&state)?;
    let value = nwb_report::json::render(&ctx);
    Ok(axum::Json(value))
}
