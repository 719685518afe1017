// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Which primary artifact format a validation outcome gets.

use nwb_core::ValidationOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Json,
}

/// PDF for PASSED and PASSED_WITH_ISSUES, JSON for FAILED. The JSON
/// rendering is always produced regardless of this choice (it's the
/// machine-readable artifact); this only decides which one is "primary".
pub fn primary_format(outcome: ValidationOutcome) -> ReportFormat {
    match outcome {
        ValidationOutcome::Passed | ValidationOutcome::PassedWithIssues => ReportFormat::Pdf,
        ValidationOutcome::Failed => ReportFormat::Json,
    }
}
