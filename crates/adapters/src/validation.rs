// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The underlying NWB validator: a black-box callable
//! returning a list of issues with severity.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use nwb_core::ValidationIssue;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to spawn validator process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("validator process exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },
    #[error("validator produced unparseable output: {0}")]
    MalformedOutput(#[source] serde_json::Error),
}

#[async_trait]
pub trait NwbValidator: Send + Sync {
    async fn validate(&self, nwb_path: &Path) -> Result<Vec<ValidationIssue>, ValidationError>;
}

/// Spawns a configured external command (`NWB_VALIDATOR_CMD`, default
/// `nwbinspector-run`) against the NWB file and parses a JSON array of
/// `ValidationIssue` from stdout.
pub struct SubprocessNwbValidator {
    command: String,
}

impl SubprocessNwbValidator {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl Default for SubprocessNwbValidator {
    fn default() -> Self {
        Self::new(std::env::var("NWB_VALIDATOR_CMD").unwrap_or_else(|_| "nwbinspector-run".to_string()))
    }
}

#[async_trait]
impl NwbValidator for SubprocessNwbValidator {
    async fn validate(&self, nwb_path: &Path) -> Result<Vec<ValidationIssue>, ValidationError> {
        let output = Command::new(&self.command)
            .arg(nwb_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(ValidationError::Spawn)?;

        if !output.status.success() {
            return Err(ValidationError::NonZeroExit {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(ValidationError::MalformedOutput)
    }
}

/// Test double returning a scripted issue list.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeNwbValidator {
    pub issues: parking_lot::Mutex<Vec<ValidationIssue>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeNwbValidator {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues: parking_lot::Mutex::new(issues) }
    }

    pub fn set_issues(&self, issues: Vec<ValidationIssue>) {
        *self.issues.lock() = issues;
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl NwbValidator for FakeNwbValidator {
    async fn validate(&self, _nwb_path: &Path) -> Result<Vec<ValidationIssue>, ValidationError> {
        Ok(self.issues.lock().clone())
    }
}
