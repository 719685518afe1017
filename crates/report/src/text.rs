// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text inspection report: `<base>_inspection_report.txt`. Always
//! produced alongside whichever of PDF/JSON is primary.

use crate::model::ReportContext;

pub fn render(ctx: &ReportContext) -> String {
    let mut out = String::new();
    out.push_str(&format!("NWB inspection report — session {}\n", ctx.session_id));
    out.push_str(&format!("outcome: {}\n", ctx.report.outcome));
    out.push_str(&format!("dandi_readiness_score: {}\n", ctx.report.dandi_readiness_score));
    out.push_str(&format!("output: {} ({})\n\n", ctx.nwb_path.display(), ctx.nwb_checksum));

    if ctx.report.issues.is_empty() {
        out.push_str("no issues found\n");
    } else {
        for issue in &ctx.report.issues {
            out.push_str(&format!(
                "{:<28} {:<28} {:<24} {}\n",
                issue.severity.to_string().to_uppercase(),
                issue.check_name,
                issue.location,
                issue.message,
            ));
        }
    }

    if !ctx.metadata_warnings.is_empty() {
        out.push_str("\nmetadata warnings (low/medium confidence, auto-applied):\n");
        for (field, warning) in &ctx.metadata_warnings {
            out.push_str(&format!(
                "  {field}: applied \"{}\" (confidence {}) — {}\n",
                warning.value, warning.confidence, warning.reason
            ));
        }
    }

    out
}
