// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversion Worker: format detection, metadata shape
//! transformation, invocation of the external conversion callable, checksum
//! computation, output versioning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nwb_adapters::{sha256_file, ConversionError, ConversionLibrary, ConversionRequest, LlmClient, LlmRequest};
use nwb_core::MetadataValue;
use thiserror::Error;

use crate::metadata_shape;

pub const WORKER_NAME: &str = "conversion";
pub const ACTION_DETECT_FORMAT: &str = "detect_format";
pub const ACTION_RUN_CONVERSION: &str = "run_conversion";
pub const ACTION_APPLY_CORRECTIONS: &str = "apply_corrections";

#[derive(Debug, Error)]
pub enum ConversionWorkerError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("failed to compute output checksum: {0}")]
    Checksum(#[source] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct DetectedFormat {
    pub format: String,
    pub confidence: u8,
}

#[derive(Debug, Clone)]
pub struct RunConversionOutcome {
    pub output_path: PathBuf,
    pub checksum: String,
}

/// Drives format detection and conversion. Holds trait objects for the
/// external conversion library and (optionally) the LLM, so it composes with
/// whatever adapter the server wired up.
pub struct ConversionWorker {
    library: Arc<dyn ConversionLibrary>,
    llm: Arc<dyn LlmClient>,
    output_dir: PathBuf,
}

impl ConversionWorker {
    pub fn new(library: Arc<dyn ConversionLibrary>, llm: Arc<dyn LlmClient>, output_dir: PathBuf) -> Self {
        Self { library, llm, output_dir }
    }

    /// Detect the recording format. Prefers an LLM classification over the
    /// header bytes/directory listing when its self-reported confidence is
    /// >=70; otherwise (or on LLM failure) falls back to rule-based
    /// detection.
    pub async fn detect_format(&self, input_path: &Path) -> DetectedFormat {
        let rule_based = nwb_adapters::detect_format_rule_based(input_path);

        match self.llm_classify(input_path).await {
            Some(llm_guess) if llm_guess.confidence >= 70 => llm_guess,
            _ => rule_based
                .map(|d| DetectedFormat { format: d.format, confidence: d.confidence })
                .unwrap_or(DetectedFormat { format: "Unknown".to_string(), confidence: 0 }),
        }
    }

    async fn llm_classify(&self, input_path: &Path) -> Option<DetectedFormat> {
        let listing = directory_listing(input_path);
        let system = "Classify the neurophysiology recording format from this directory listing. \
                      Respond with JSON: {\"format\": \"SpikeGLX\"|\"OpenEphys\"|\"Neuropixels\"|\"Unknown\", \
                      \"confidence\": 0-100}."
            .to_string();
        let reply = self.llm.complete(LlmRequest::new(system, listing)).await.ok()?;
        let parsed: serde_json::Value = serde_json::from_str(&reply).ok()?;
        Some(DetectedFormat {
            format: parsed.get("format")?.as_str()?.to_string(),
            confidence: parsed.get("confidence")?.as_u64()?.min(100) as u8,
        })
    }

    /// Run the conversion: transform metadata, version the output path,
    /// invoke the external library, checksum the result. `correction_attempt`
    /// is the session's current attempt counter (0 for the initial
    /// conversion).
    pub async fn run_conversion(
        &self,
        input_path: &Path,
        format: &str,
        user_metadata: &HashMap<String, MetadataValue>,
        correction_attempt: u32,
    ) -> Result<RunConversionOutcome, ConversionWorkerError> {
        let metadata = metadata_shape::transform(user_metadata);
        let output_path = self.versioned_output_path(input_path, correction_attempt);

        let result = self
            .library
            .convert(ConversionRequest {
                input_path: input_path.to_path_buf(),
                format: format.to_string(),
                metadata,
                output_path: output_path.clone(),
            })
            .await?;

        let checksum = sha256_file(&result.output_path).map_err(ConversionWorkerError::Checksum)?;
        Ok(RunConversionOutcome { output_path: result.output_path, checksum })
    }

    /// Merge a metadata correction patch and re-run conversion at the next
    /// version. `correction_attempt` is
    /// expected to already reflect the store's post-increment value.
    pub async fn apply_corrections(
        &self,
        input_path: &Path,
        format: &str,
        user_metadata: &HashMap<String, MetadataValue>,
        corrections: &HashMap<String, MetadataValue>,
        correction_attempt: u32,
    ) -> Result<RunConversionOutcome, ConversionWorkerError> {
        let mut merged = user_metadata.clone();
        merged.extend(corrections.clone());
        self.run_conversion(input_path, format, &merged, correction_attempt).await
    }

    /// First attempt (`correction_attempt == 0`) writes `<base>.nwb`; retry
    /// *k* (`correction_attempt == k`) writes `<base>_v{k+1}.nwb`. Prior
    /// versions are never overwritten because each attempt gets a distinct
    /// path.
    fn versioned_output_path(&self, input_path: &Path, correction_attempt: u32) -> PathBuf {
        let stem = input_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "recording".into());
        let filename = if correction_attempt == 0 { format!("{stem}.nwb") } else { format!("{stem}_v{}.nwb", correction_attempt + 1) };
        self.output_dir.join(filename)
    }
}

fn directory_listing(input_path: &Path) -> String {
    let dir = if input_path.is_dir() { input_path } else { input_path.parent().unwrap_or(Path::new(".")) };
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}
