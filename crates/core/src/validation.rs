// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation domain types shared between the Evaluation Worker
//! (`nwb-workers`) and report rendering (`nwb-report`): issues, outcome
//! classification, the DANDI-readiness score, and the workflow trace.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Severity of a single validator finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Error,
    Warning,
    BestPracticeViolation,
    BestPracticeSuggestion,
    Info,
}

crate::simple_display! {
    Severity {
        Critical => "critical",
        Error => "error",
        Warning => "warning",
        BestPracticeViolation => "best_practice_violation",
        BestPracticeSuggestion => "best_practice_suggestion",
        Info => "info",
    }
}

impl Severity {
    /// Points deducted from the DANDI-readiness score for one occurrence of
    /// this severity.
    fn score_weight(self) -> u8 {
        match self {
            Self::Critical => 30,
            Self::Error => 20,
            Self::Warning => 10,
            Self::BestPracticeViolation => 5,
            Self::BestPracticeSuggestion => 3,
            Self::Info => 2,
        }
    }
}

/// One finding returned by the external NWB validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub check_name: String,
    pub message: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

/// Classification of a validation pass, driving the dialogue phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Passed,
    PassedWithIssues,
    Failed,
}

crate::simple_display! {
    ValidationOutcome {
        Passed => "passed",
        PassedWithIssues => "passed_with_issues",
        Failed => "failed",
    }
}

/// Classify a multiset of issues into an outcome.
///
/// FAILED iff at least one CRITICAL or ERROR; an INFO-only multiset (or an
/// empty one) classifies as PASSED, not PASSED_WITH_ISSUES.
pub fn classify_outcome(issues: &[ValidationIssue]) -> ValidationOutcome {
    if issues.iter().any(|i| matches!(i.severity, Severity::Critical | Severity::Error)) {
        return ValidationOutcome::Failed;
    }
    if issues.iter().any(|i| {
        matches!(
            i.severity,
            Severity::Warning | Severity::BestPracticeViolation | Severity::BestPracticeSuggestion
        )
    }) {
        return ValidationOutcome::PassedWithIssues;
    }
    ValidationOutcome::Passed
}

/// Compute the DANDI-readiness score: starts at 100, deducts
/// [`Severity::score_weight`] per issue, floored at 0.
pub fn dandi_readiness_score(issues: &[ValidationIssue]) -> u8 {
    let deduction: u32 = issues.iter().map(|i| i.severity.score_weight() as u32).sum();
    100u32.saturating_sub(deduction).min(100) as u8
}

/// Group issues by severity for report rendering and the `/api/status`
/// summary counts.
pub fn group_by_severity(issues: &[ValidationIssue]) -> HashMap<Severity, Vec<ValidationIssue>> {
    let mut grouped: HashMap<Severity, Vec<ValidationIssue>> = HashMap::new();
    for issue in issues {
        grouped.entry(issue.severity).or_default().push(issue.clone());
    }
    grouped
}

/// One timed step in a workflow trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub ordinal: u32,
    pub description: String,
    pub duration_seconds: f64,
}

/// Provenance record attached to every output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTrace {
    pub input_path: String,
    pub input_checksum: Option<String>,
    pub detected_format: Option<String>,
    pub steps: Vec<WorkflowStep>,
    pub technologies: HashMap<String, String>,
    pub parameters: HashMap<String, String>,
    pub output_path: String,
    pub output_checksum: String,
    pub started_at_ms: u64,
    pub duration_seconds: f64,
}

/// The fully-assembled validation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    pub issues: Vec<ValidationIssue>,
    pub dandi_readiness_score: u8,
    pub workflow_trace: WorkflowTrace,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>, workflow_trace: WorkflowTrace) -> Self {
        let outcome = classify_outcome(&issues);
        let dandi_readiness_score = dandi_readiness_score(&issues);
        Self { outcome, issues, dandi_readiness_score, workflow_trace }
    }

    pub fn issues_by_severity(&self) -> HashMap<Severity, Vec<ValidationIssue>> {
        group_by_severity(&self.issues)
    }
}
