// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The underlying NWB conversion library: a black-box callable that takes an
//! input path + metadata and writes an NWB file.
//!
//! Spawns and supervises an external process: a configured command,
//! structured stdout, stderr surfaced as the failure message on nonzero
//! exit.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to spawn conversion process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("conversion process exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },
    #[error("conversion process produced no output path")]
    NoOutput,
    #[error("failed to write metadata scratch file: {0}")]
    MetadataWrite(#[source] std::io::Error),
}

/// One conversion invocation.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub format: String,
    /// Already transformed into the nested shape the external library
    /// expects — transformation is the Conversion
    /// Worker's job, not the adapter's.
    pub metadata: Value,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub output_path: PathBuf,
}

#[async_trait]
pub trait ConversionLibrary: Send + Sync {
    async fn convert(&self, request: ConversionRequest) -> Result<ConversionOutput, ConversionError>;
}

/// Spawns a configured external command (`NWB_CONVERTER_CMD`, default
/// `neuroconv-run`) with `<input_path> <metadata_json_path> <output_path>`.
/// The command is expected to write the NWB file to `output_path` and print
/// nothing of consequence on success; any nonzero exit surfaces stderr as
/// the failure message.
pub struct SubprocessConversionLibrary {
    command: String,
}

impl SubprocessConversionLibrary {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl Default for SubprocessConversionLibrary {
    fn default() -> Self {
        Self::new(std::env::var("NWB_CONVERTER_CMD").unwrap_or_else(|_| "neuroconv-run".to_string()))
    }
}

#[async_trait]
impl ConversionLibrary for SubprocessConversionLibrary {
    async fn convert(&self, request: ConversionRequest) -> Result<ConversionOutput, ConversionError> {
        let metadata_file = tempfile_path(&request.output_path, "metadata.json");
        let metadata_bytes =
            serde_json::to_vec_pretty(&request.metadata).map_err(|e| ConversionError::MetadataWrite(e.into()))?;
        tokio::fs::write(&metadata_file, metadata_bytes).await.map_err(ConversionError::MetadataWrite)?;

        let output = Command::new(&self.command)
            .arg(&request.input_path)
            .arg(&request.format)
            .arg(&metadata_file)
            .arg(&request.output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(ConversionError::Spawn)?;

        let _ = tokio::fs::remove_file(&metadata_file).await;

        if !output.status.success() {
            return Err(ConversionError::NonZeroExit {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !request.output_path.exists() {
            return Err(ConversionError::NoOutput);
        }

        Ok(ConversionOutput { output_path: request.output_path })
    }
}

fn tempfile_path(anchor: &Path, suffix: &str) -> PathBuf {
    let parent = anchor.parent().unwrap_or_else(|| Path::new("."));
    let stem = anchor.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "conversion".into());
    parent.join(format!("{stem}.{suffix}"))
}

/// Deterministic in-memory stand-in for tests: writes a small placeholder
/// file instead of invoking a real converter, with configurable
/// success/failure.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeConversionLibrary {
    pub should_fail: parking_lot::Mutex<Option<String>>,
    pub content: Vec<u8>,
    call_count: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeConversionLibrary {
    pub fn new() -> Self {
        Self { should_fail: parking_lot::Mutex::new(None), content: b"NWB-FAKE-FILE".to_vec(), call_count: std::sync::atomic::AtomicUsize::new(0) }
    }

    pub fn fail_next_with(&self, message: impl Into<String>) {
        *self.should_fail.lock() = Some(message.into());
    }

    /// Number of `convert()` invocations so far — lets a caller assert that
    /// a refused retry never reached the conversion
    /// library at all.
    pub fn calls(&self) -> usize {
        self.call_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeConversionLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ConversionLibrary for FakeConversionLibrary {
    async fn convert(&self, request: ConversionRequest) -> Result<ConversionOutput, ConversionError> {
        self.call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(message) = self.should_fail.lock().take() {
            return Err(ConversionError::NonZeroExit { status: 1, stderr: message });
        }
        if let Some(parent) = request.output_path.parent() {
            std::fs::create_dir_all(parent).map_err(ConversionError::MetadataWrite)?;
        }
        std::fs::write(&request.output_path, &self.content).map_err(ConversionError::MetadataWrite)?;
        Ok(ConversionOutput { output_path: request.output_path })
    }
}
