// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applies a [`ParsedField`] to the store according to the confidence-tier
//! policy.

use nwb_core::clock::Clock;
use nwb_core::{ConfidenceTier, LogSeverity, MetadataValue, MetadataWarning, ParsedField, SessionStore};

/// Write one parsed field into `store.user_metadata`, logging and (for
/// MEDIUM/LOW confidence) recording a [`MetadataWarning`] per the tier
/// policy. Every tier applies the value — only the logging/warning
/// bookkeeping differs.
pub fn apply_parsed_field<C: Clock>(store: &SessionStore<C>, field: &ParsedField) {
    let value = MetadataValue::Text(field.normalized_value.clone());
    store.set_metadata_field(field.field_name.clone(), value.clone());

    match field.tier() {
        ConfidenceTier::High => {
            store.append_log(LogSeverity::Info, format!("{}: set to \"{}\"", field.field_name, field.normalized_value));
        }
        ConfidenceTier::Medium => {
            store.append_log(
                LogSeverity::Warning,
                format!("{}: medium confidence best guess \"{}\" ({})", field.field_name, field.normalized_value, field.reasoning),
            );
        }
        ConfidenceTier::Low => {
            store.append_log(
                LogSeverity::Warning,
                format!("{}: low confidence guess \"{}\" ({})", field.field_name, field.normalized_value, field.reasoning),
            );
            store.add_metadata_warning(
                field.field_name.clone(),
                MetadataWarning { value, confidence: field.confidence, reason: field.reasoning.clone() },
            );
        }
    }
}

pub fn apply_parsed_fields<C: Clock>(store: &SessionStore<C>, fields: &[ParsedField]) {
    for field in fields {
        apply_parsed_field(store, field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwb_core::clock::FakeClock;

    fn field(field_name: &str, confidence: u8) -> ParsedField {
        ParsedField {
            field_name: field_name.to_string(),
            raw_input: "raw".to_string(),
            normalized_value: "Mus musculus".to_string(),
            confidence,
            reasoning: "test".to_string(),
            needs_review: false,
            alternatives: vec![],
        }
    }

    #[test]
    fn high_confidence_applies_silently_without_a_warning() {
        let store = SessionStore::new(FakeClock::new());
        apply_parsed_field(&store, &field("species", 95));
        let session = store.snapshot();
        assert_eq!(session.user_metadata["species"].as_text(), Some("Mus musculus"));
        assert!(session.metadata_warnings.is_empty());
        assert_eq!(session.logs.len(), 1);
        assert_eq!(session.logs[0].severity, nwb_core::LogSeverity::Info);
    }

    #[test]
    fn medium_confidence_applies_with_a_warning_log_but_no_recorded_warning() {
        let store = SessionStore::new(FakeClock::new());
        apply_parsed_field(&store, &field("species", 65));
        let session = store.snapshot();
        assert!(session.user_metadata.contains_key("species"));
        assert!(session.metadata_warnings.is_empty());
        assert_eq!(session.logs[0].severity, nwb_core::LogSeverity::Warning);
    }

    #[test]
    fn low_confidence_applies_and_records_a_metadata_warning() {
        let store = SessionStore::new(FakeClock::new());
        apply_parsed_field(&store, &field("species", 30));
        let session = store.snapshot();
        assert!(session.user_metadata.contains_key("species"));
        assert!(session.metadata_warnings.contains_key("species"));
        assert_eq!(session.metadata_warnings["species"].confidence, 30);
    }
}
