// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Evaluation Worker: runs the external validator, builds
//! the [`ValidationReport`], classifies the outcome, scores DANDI readiness,
//! and (optionally) asks the LLM to produce a plain-language explanation of
//! failures for the Dialogue Worker to relay.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use nwb_adapters::{LlmClient, LlmRequest, NwbValidator, ValidationError};
use nwb_core::{classify_outcome, dandi_readiness_score, ValidationIssue, ValidationOutcome, ValidationReport, WorkflowTrace};
use nwb_report::model::IssueCluster;
use thiserror::Error;

use nwb_llm::prompts::generate_failure_explanation;

pub const WORKER_NAME: &str = "evaluation";
pub const ACTION_RUN_VALIDATION: &str = "run_validation";

#[derive(Debug, Error)]
pub enum EvaluationWorkerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub report: ValidationReport,
    pub outcome: ValidationOutcome,
    pub dandi_readiness_score: u8,
    /// Present only when `outcome == Failed`: an LLM-backed (or rule-based
    /// template) explanation of what went wrong, for the Dialogue Worker to
    /// surface in chat.
    pub failure_explanation: Option<String>,
    /// Issues grouped by root cause with a plain-language explanation per
    /// group. Best-effort: empty whenever the LLM is unavailable or its
    /// reply can't be parsed, never populated when there are no issues.
    pub issue_clusters: Vec<IssueCluster>,
}

pub struct EvaluationWorker {
    validator: Arc<dyn NwbValidator>,
    llm: Arc<dyn LlmClient>,
    output_dir: std::path::PathBuf,
}

impl EvaluationWorker {
    pub fn new(validator: Arc<dyn NwbValidator>, llm: Arc<dyn LlmClient>, output_dir: std::path::PathBuf) -> Self {
        Self { validator, llm, output_dir }
    }

    /// Validate `nwb_path` and assemble the full report. `partial_trace` is
    /// the workflow trace accumulated so far by the Conversion Worker; this
    /// appends the validation step and finalizes `duration_seconds`.
    pub async fn run_validation(
        &self,
        nwb_path: &Path,
        mut trace: WorkflowTrace,
        step_started_at: Instant,
    ) -> Result<EvaluationOutcome, EvaluationWorkerError> {
        let issues = self.validator.validate(nwb_path).await?;
        let outcome = classify_outcome(&issues);
        let score = dandi_readiness_score(&issues);

        trace.steps.push(nwb_core::WorkflowStep {
            ordinal: trace.steps.len() as u32 + 1,
            description: "Validated output against NWB Inspector".to_string(),
            duration_seconds: step_started_at.elapsed().as_secs_f64(),
        });
        trace.duration_seconds = trace.steps.iter().map(|s| s.duration_seconds).sum();

        let report = ValidationReport::new(issues, trace);

        let failure_explanation = if matches!(outcome, ValidationOutcome::Failed) {
            Some(generate_failure_explanation(self.llm.as_ref(), &failing_issues_summary(&report.issues)).await)
        } else {
            None
        };

        let issue_clusters = if matches!(outcome, ValidationOutcome::Failed | ValidationOutcome::PassedWithIssues) {
            self.cluster_issues(&report.issues).await
        } else {
            Vec::new()
        };

        Ok(EvaluationOutcome { report, outcome, dandi_readiness_score: score, failure_explanation, issue_clusters })
    }

    /// Best-effort: asks the LLM to group issues by root cause and explain
    /// each group in plain language. Returns an empty vec on any failure —
    /// unavailable LLM, malformed JSON, or a cluster naming no known check.
    async fn cluster_issues(&self, issues: &[ValidationIssue]) -> Vec<IssueCluster> {
        if issues.is_empty() {
            return Vec::new();
        }

        let listing = issues.iter().map(|i| format!("{} | {} | {}", i.severity, i.check_name, i.message)).collect::<Vec<_>>().join("\n");
        let system = "Group these NWB validation issues by root cause so related checks become one cluster. \
                      Respond with JSON: {\"clusters\": [{\"root_cause\": \"...\", \"member_checks\": [\"check_name\", ...], \
                      \"explanation\": \"one or two plain-language sentences\"}]}."
            .to_string();

        let Ok(reply) = self.llm.complete(LlmRequest::new(system, listing)).await else {
            return Vec::new();
        };
        let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&reply) else {
            return Vec::new();
        };
        let Some(clusters) = parsed.get("clusters").and_then(|c| c.as_array()) else {
            return Vec::new();
        };

        clusters
            .iter()
            .filter_map(|c| {
                let root_cause = c.get("root_cause")?.as_str()?.to_string();
                let member_checks: Vec<String> =
                    c.get("member_checks")?.as_array()?.iter().filter_map(|v| v.as_str().map(String::from)).collect();
                if member_checks.is_empty() {
                    return None;
                }
                let plain_language_explanation = c.get("explanation").and_then(|v| v.as_str()).map(String::from);
                let representative = issues.iter().find(|i| member_checks.contains(&i.check_name)).or_else(|| issues.first())?.clone();
                Some(IssueCluster { root_cause, member_checks, plain_language_explanation, representative })
            })
            .collect()
    }

    /// Writes the PDF/JSON/text report artifacts for `ctx` to this worker's
    /// output directory. Failure here never aborts validation — the caller
    /// logs and moves on.
    pub fn persist_reports(&self, ctx: &nwb_report::ReportContext) -> Result<nwb_report::PersistedReportPaths, nwb_report::PersistError> {
        nwb_report::persist::write_reports(ctx, &self.output_dir)
    }
}

fn failing_issues_summary(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .filter(|i| matches!(i.severity, nwb_core::Severity::Critical | nwb_core::Severity::Error))
        .map(|i| format!("{} ({}): {}", i.check_name, i.location, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}
