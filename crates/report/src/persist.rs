// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Writes the three report artifacts to disk next to the converted NWB file:
//! `<base>_evaluation_report.pdf`, `<base>_validation_report_<timestamp>.json`,
//! `<base>_inspection_report.txt`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::ReportContext;
use crate::{json, pdf, text};

#[derive(Debug, Clone)]
pub struct PersistedReportPaths {
    pub pdf_path: PathBuf,
    pub json_path: PathBuf,
    pub text_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Pdf(#[from] crate::pdf::PdfError),
    #[error("failed to write report artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// A retry's output is `<stem>_v{N}.nwb`; reports for every attempt share the
/// first attempt's base name so `<base>_evaluation_report.pdf` always refers
/// to the same recording regardless of how many corrections it took.
fn base_stem(nwb_path: &Path) -> String {
    let stem = nwb_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "recording".to_string());
    match stem.rfind("_v") {
        Some(idx) if idx + 2 < stem.len() && stem[idx + 2..].bytes().all(|b| b.is_ascii_digit()) => stem[..idx].to_string(),
        _ => stem,
    }
}

pub fn write_reports(ctx: &ReportContext, output_dir: &Path) -> Result<PersistedReportPaths, PersistError> {
    let base = base_stem(&ctx.nwb_path);
    let timestamp = chrono::Utc::now().timestamp();

    let pdf_path = output_dir.join(format!("{base}_evaluation_report.pdf"));
    let json_path = output_dir.join(format!("{base}_validation_report_{timestamp}.json"));
    let text_path = output_dir.join(format!("{base}_inspection_report.txt"));

    std::fs::write(&pdf_path, pdf::render(ctx)?)?;
    std::fs::write(&json_path, serde_json::to_vec_pretty(&json::render(ctx)).unwrap_or_default())?;
    std::fs::write(&text_path, text::render(ctx))?;

    Ok(PersistedReportPaths { pdf_path, json_path, text_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwb_core::{Severity, ValidationIssue, WorkflowTrace};
    use std::collections::HashMap;

    fn ctx(nwb_path: &str) -> ReportContext {
        ReportContext {
            session_id: "ses-1".into(),
            nwb_path: PathBuf::from(nwb_path),
            nwb_checksum: "abc123".into(),
            validation_status: Some("passed_accepted".into()),
            report: nwb_core::ValidationReport::new(
                vec![ValidationIssue {
                    severity: Severity::Warning,
                    check_name: "check_units".into(),
                    message: "units missing".into(),
                    location: "/acquisition".into(),
                    suggested_fix: None,
                }],
                WorkflowTrace {
                    input_path: "in.bin".into(),
                    input_checksum: None,
                    detected_format: Some("SpikeGLX".into()),
                    steps: vec![],
                    technologies: HashMap::new(),
                    parameters: HashMap::new(),
                    output_path: nwb_path.to_string(),
                    output_checksum: "abc123".into(),
                    started_at_ms: 0,
                    duration_seconds: 1.0,
                },
            ),
            user_metadata: HashMap::new(),
            metadata_warnings: HashMap::new(),
            generated_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn writes_all_three_artifacts_with_the_spec_naming() {
        let dir = tempfile::tempdir().unwrap();
        let nwb_path = dir.path().join("recording.nwb");
        let paths = write_reports(&ctx(nwb_path.to_str().unwrap()), dir.path()).unwrap();

        assert_eq!(paths.pdf_path.file_name().unwrap(), "recording_evaluation_report.pdf");
        assert!(paths.json_path.file_name().unwrap().to_str().unwrap().starts_with("recording_validation_report_"));
        assert_eq!(paths.text_path.file_name().unwrap(), "recording_inspection_report.txt");
        assert!(paths.pdf_path.exists());
        assert!(paths.json_path.exists());
        assert!(paths.text_path.exists());
    }

    #[test]
    fn retry_output_reuses_the_first_attempts_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let nwb_path = dir.path().join("recording_v2.nwb");
        let paths = write_reports(&ctx(nwb_path.to_str().unwrap()), dir.path()).unwrap();

        assert_eq!(paths.pdf_path.file_name().unwrap(), "recording_evaluation_report.pdf");
        assert_eq!(paths.text_path.file_name().unwrap(), "recording_inspection_report.txt");
    }
}
