// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient output of a single metadata-field extraction pass.
//!
//! A [`ParsedField`] never lands in [`crate::session::Session`] directly: the
//! dialogue worker consumes it, decides what to do based on `confidence`, and
//! writes either a plain [`crate::session::MetadataValue`] or a
//! [`crate::session::MetadataWarning`] into the store.

use serde::{Deserialize, Serialize};

/// A candidate value for one metadata field, as produced by the LLM-assisted
/// or rule-based extractor, before the confidence-tier policy is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedField {
    pub field_name: String,
    pub raw_input: String,
    pub normalized_value: String,
    /// 0-100. HIGH (>=80) auto-applies silently, MEDIUM (50-79) applies with
    /// a warning, LOW (<50) applies with a warning and a review flag.
    pub confidence: u8,
    pub reasoning: String,
    pub needs_review: bool,
    pub alternatives: Vec<String>,
}

/// Confidence tier governing how a [`ParsedField`] is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ParsedField {
    pub fn tier(&self) -> ConfidenceTier {
        match self.confidence {
            80..=u8::MAX => ConfidenceTier::High,
            50..=79 => ConfidenceTier::Medium,
            _ => ConfidenceTier::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(confidence: u8) -> ParsedField {
        ParsedField {
            field_name: "experimenter".into(),
            raw_input: "jane doe did this".into(),
            normalized_value: "Jane Doe".into(),
            confidence,
            reasoning: "extracted from free text".into(),
            needs_review: false,
            alternatives: vec![],
        }
    }

    #[test]
    fn tiers_match_confidence_boundaries() {
        assert_eq!(field(100).tier(), ConfidenceTier::High);
        assert_eq!(field(80).tier(), ConfidenceTier::High);
        assert_eq!(field(79).tier(), ConfidenceTier::Medium);
        assert_eq!(field(50).tier(), ConfidenceTier::Medium);
        assert_eq!(field(49).tier(), ConfidenceTier::Low);
        assert_eq!(field(0).tier(), ConfidenceTier::Low);
    }
}
