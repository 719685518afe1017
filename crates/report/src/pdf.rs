// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PDF rendering for PASSED / PASSED_WITH_ISSUES outcomes: a title page, an
//! issues table, and a workflow-trace page, via `printpdf`.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use thiserror::Error;

use crate::model::ReportContext;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to load builtin font: {0}")]
    Font(String),
    #[error("failed to serialize PDF: {0}")]
    Save(#[source] std::io::Error),
}

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;

pub fn render(ctx: &ReportContext) -> Result<Vec<u8>, PdfError> {
    let (doc, title_page, title_layer) =
        PdfDocument::new(format!("NWB conversion report — {}", ctx.session_id), Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "title");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| PdfError::Font(e.to_string()))?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| PdfError::Font(e.to_string()))?;

    let title_layer = doc.get_page(title_page).get_layer(title_layer);
    title_layer.use_text("NWB Conversion Report", 22.0, Mm(20.0), Mm(270.0), &bold);
    title_layer.use_text(format!("Session: {}", ctx.session_id), 12.0, Mm(20.0), Mm(255.0), &font);
    title_layer.use_text(format!("Outcome: {}", ctx.report.outcome), 12.0, Mm(20.0), Mm(247.0), &font);
    title_layer.use_text(
        format!("DANDI readiness score: {}/100", ctx.report.dandi_readiness_score),
        12.0,
        Mm(20.0),
        Mm(239.0),
        &font,
    );
    title_layer.use_text(format!("Output file: {}", ctx.nwb_path.display()), 10.0, Mm(20.0), Mm(231.0), &font);
    title_layer.use_text(format!("Checksum: {}", ctx.nwb_checksum), 10.0, Mm(20.0), Mm(225.0), &font);

    let (issues_page, issues_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "issues");
    let issues_layer = doc.get_page(issues_page).get_layer(issues_layer);
    issues_layer.use_text("Validation issues", 16.0, Mm(20.0), Mm(270.0), &bold);

    if ctx.report.issues.is_empty() {
        issues_layer.use_text("No issues found.", 11.0, Mm(20.0), Mm(255.0), &font);
    } else {
        let mut y = 255.0;
        for issue in ctx.report.issues.iter().take(40) {
            let line = format!(
                "[{}] {} ({}): {}",
                issue.severity.to_string().to_uppercase(),
                issue.check_name,
                issue.location,
                issue.message
            );
            issues_layer.use_text(truncate(&line, 110), 9.0, Mm(20.0), Mm(y), &font);
            y -= 6.0;
            if y < 20.0 {
                break;
            }
        }
    }

    let (trace_page, trace_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "workflow trace");
    let trace_layer = doc.get_page(trace_page).get_layer(trace_layer);
    trace_layer.use_text("Workflow trace", 16.0, Mm(20.0), Mm(270.0), &bold);
    let trace = &ctx.report.workflow_trace;
    trace_layer.use_text(format!("Input: {}", trace.input_path), 10.0, Mm(20.0), Mm(255.0), &font);
    trace_layer.use_text(
        format!("Detected format: {}", trace.detected_format.as_deref().unwrap_or("unknown")),
        10.0,
        Mm(20.0),
        Mm(248.0),
        &font,
    );
    trace_layer.use_text(format!("Duration: {:.1}s", trace.duration_seconds), 10.0, Mm(20.0), Mm(241.0), &font);

    let mut y = 230.0;
    for step in trace.steps.iter().take(30) {
        let line = format!("{:>2}. {} ({:.2}s)", step.ordinal, step.description, step.duration_seconds);
        trace_layer.use_text(truncate(&line, 110), 9.0, Mm(20.0), Mm(y), &font);
        y -= 6.0;
        if y < 20.0 {
            break;
        }
    }

    let mut bytes = Vec::new();
    doc.save(&mut std::io::BufWriter::new(&mut bytes)).map_err(PdfError::Save)?;
    Ok(bytes)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", &s[..max])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwb_core::WorkflowTrace;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn ctx() -> ReportContext {
        ReportContext {
            session_id: "ses-1".into(),
            nwb_path: PathBuf::from("out.nwb"),
            nwb_checksum: "abc123".into(),
            validation_status: Some("passed_accepted".into()),
            report: nwb_core::ValidationReport::new(
                vec![],
                WorkflowTrace {
                    input_path: "in.bin".into(),
                    input_checksum: None,
                    detected_format: Some("SpikeGLX".into()),
                    steps: vec![],
                    technologies: HashMap::new(),
                    parameters: HashMap::new(),
                    output_path: "out.nwb".into(),
                    output_checksum: "abc123".into(),
                    started_at_ms: 0,
                    duration_seconds: 12.5,
                },
            ),
            user_metadata: HashMap::new(),
            metadata_warnings: HashMap::new(),
            generated_at_ms: 0,
        }
    }

    #[test]
    fn renders_a_nonempty_pdf_byte_stream() {
        let bytes = render(&ctx()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..4], b"%PDF");
    }

    #[test]
    fn truncate_leaves_short_strings_untouched() {
        assert_eq!(truncate("short", 10), "short");
    }
}
