// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON rendering: `<base>_validation_report_<timestamp>.json`.

use nwb_core::Severity;
use serde_json::{json, Value};

use crate::model::ReportContext;

pub fn render(ctx: &ReportContext) -> Value {
    let by_severity = ctx.report.issues_by_severity();
    let count = |sev: Severity| by_severity.get(&sev).map(|v| v.len()).unwrap_or(0);

    json!({
        "report_metadata": {
            "session_id": ctx.session_id,
            "generated_at_ms": ctx.generated_at_ms,
        },
        "nwb_file": {
            "path": ctx.nwb_path.to_string_lossy(),
            "checksum": ctx.nwb_checksum,
        },
        "validation_status": ctx.validation_status,
        "summary": {
            "total": ctx.report.issues.len(),
            "critical": count(Severity::Critical),
            "best_practice_violation": count(Severity::BestPracticeViolation),
            "best_practice_suggestion": count(Severity::BestPracticeSuggestion),
        },
        "issues": ctx.report.issues,
        "metadata": {
            "fields": ctx.user_metadata,
            "warnings": ctx.metadata_warnings,
        },
        "workflow_trace": ctx.report.workflow_trace,
        "dandi_readiness": ctx.report.dandi_readiness_score,
    })
}
