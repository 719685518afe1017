// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The input to every renderer: everything about a completed/failed
//! conversion that needs to land in a report artifact, gathered from the
//! session rather than recomputed.

use std::collections::HashMap;
use std::path::PathBuf;

use nwb_core::{MetadataValue, MetadataWarning, ValidationIssue, ValidationReport};

/// A group of validation issues sharing one root cause, with an optional
/// LLM-generated plain-language explanation. Best-effort: absent whenever
/// the language model is unavailable or its clustering reply is malformed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssueCluster {
    pub root_cause: String,
    pub member_checks: Vec<String>,
    pub plain_language_explanation: Option<String>,
    pub representative: ValidationIssue,
}

#[derive(Debug, Clone)]
pub struct ReportContext {
    pub session_id: String,
    pub nwb_path: PathBuf,
    pub nwb_checksum: String,
    pub validation_status: Option<String>,
    pub report: ValidationReport,
    pub user_metadata: HashMap<String, MetadataValue>,
    pub metadata_warnings: HashMap<String, MetadataWarning>,
    pub generated_at_ms: u64,
}
