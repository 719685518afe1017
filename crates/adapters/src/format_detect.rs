// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule-based format detection: the fallback path for the Conversion
//! Worker's `detect_format` action when LLM classification is unavailable or
//! low-confidence.

use std::path::Path;

/// A detected recording format with the confidence the rule assigns it.
/// Rule-based detections are deterministic so confidence is always 100 or
/// absent (no match).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFormat {
    pub format: String,
    pub confidence: u8,
}

/// Inspect a directory (or a single file's siblings) for known recording
/// layouts. Checks, in order: SpikeGLX (`.ap.bin` + `.meta`), OpenEphys
/// (`structure.oebin`), Neuropixels probe-specific naming.
pub fn detect_format_rule_based(input_path: &Path) -> Option<DetectedFormat> {
    let dir = if input_path.is_dir() { input_path } else { input_path.parent()? };
    let entries: Vec<String> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_lowercase())
        .collect();

    let has_ap_bin = entries.iter().any(|n| n.ends_with(".ap.bin"));
    let has_meta = entries.iter().any(|n| n.ends_with(".meta"));
    if has_ap_bin && has_meta {
        return Some(DetectedFormat { format: "SpikeGLX".to_string(), confidence: 100 });
    }

    if entries.iter().any(|n| n == "structure.oebin") {
        return Some(DetectedFormat { format: "OpenEphys".to_string(), confidence: 100 });
    }

    if entries.iter().any(|n| n.contains("imec") || n.contains("neuropixels")) {
        return Some(DetectedFormat { format: "Neuropixels".to_string(), confidence: 100 });
    }

    None
}

/// The same format tags `detect_format_rule_based` recognizes in a
/// directory listing, keyed off a single filename instead. Used by the
/// upload handler to check a second uploaded file against the primary
/// recording's format without scanning the whole upload directory.
pub fn format_tag_for_filename(filename: &str) -> Option<&'static str> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".ap.bin") || lower.ends_with(".lf.bin") || lower.ends_with(".meta") {
        Some("SpikeGLX")
    } else if lower == "structure.oebin" || lower.ends_with(".oebin") {
        Some("OpenEphys")
    } else if lower.contains("imec") || lower.contains("neuropixels") {
        Some("Neuropixels")
    } else {
        None
    }
}
