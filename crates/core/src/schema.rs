// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The field-schema registry: the set of metadata fields the dialogue worker
//! knows how to ask about, validate, and normalize. Shared by the LLM-backed
//! extractor (which embeds it in the system prompt) and the rule-based
//! fallback extractor (which walks `normalization_rules` directly).

use once_cell::sync::Lazy;

/// A single keyword/phrase → normalized-value mapping used by the rule-based
/// extractor. Matching is case-insensitive substring containment.
#[derive(Debug, Clone)]
pub struct NormalizationRule {
    pub keyword: &'static str,
    pub normalized_value: &'static str,
}

/// Describes one recognized metadata field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub field_name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub list_valued: bool,
    pub normalization_rules: &'static [NormalizationRule],
}

/// The full set of fields the dialogue worker collects. Order matters only
/// for prompt generation (it's presented to the user/LLM in this order).
pub static FIELD_SCHEMA: Lazy<Vec<FieldSchema>> = Lazy::new(|| {
    vec![
        FieldSchema {
            field_name: "experimenter",
            description: "Name(s) of the experimenter(s), as \"Last, First\"",
            required: true,
            list_valued: true,
            normalization_rules: &[],
        },
        FieldSchema {
            field_name: "institution",
            description: "Institution where the experiment was performed",
            required: true,
            list_valued: false,
            normalization_rules: &[
                NormalizationRule { keyword: "mit", normalized_value: "Massachusetts Institute of Technology" },
                NormalizationRule { keyword: "massachusetts institute of technology", normalized_value: "Massachusetts Institute of Technology" },
            ],
        },
        FieldSchema {
            field_name: "lab",
            description: "Name of the lab",
            required: false,
            list_valued: false,
            normalization_rules: &[],
        },
        FieldSchema {
            field_name: "session_description",
            description: "Short free-text description of the recording session",
            required: true,
            list_valued: false,
            normalization_rules: &[],
        },
        FieldSchema {
            field_name: "subject_id",
            description: "Identifier for the experimental subject",
            required: false,
            list_valued: false,
            normalization_rules: &[],
        },
        FieldSchema {
            field_name: "species",
            description: "Species of the subject, in Latin binomial form",
            required: true,
            list_valued: false,
            normalization_rules: &[
                NormalizationRule { keyword: "mouse", normalized_value: "Mus musculus" },
                NormalizationRule { keyword: "mice", normalized_value: "Mus musculus" },
                NormalizationRule { keyword: "rat", normalized_value: "Rattus norvegicus" },
            ],
        },
        FieldSchema {
            field_name: "age",
            description: "Subject age, ISO 8601 duration (e.g. P56D)",
            required: true,
            list_valued: false,
            normalization_rules: &[
                NormalizationRule { keyword: "adult", normalized_value: "P90D" },
                NormalizationRule { keyword: "8 week", normalized_value: "P56D" },
                NormalizationRule { keyword: "8-week", normalized_value: "P56D" },
            ],
        },
        FieldSchema {
            field_name: "sex",
            description: "Subject sex: M, F, O, or U",
            required: true,
            list_valued: false,
            normalization_rules: &[
                NormalizationRule { keyword: "male", normalized_value: "M" },
                NormalizationRule { keyword: "female", normalized_value: "F" },
            ],
        },
        FieldSchema {
            field_name: "genotype",
            description: "Subject genotype",
            required: false,
            list_valued: false,
            normalization_rules: &[],
        },
        FieldSchema {
            field_name: "strain",
            description: "Subject strain (e.g. C57BL/6)",
            required: false,
            list_valued: false,
            normalization_rules: &[
                NormalizationRule { keyword: "c57bl/6", normalized_value: "C57BL/6" },
                NormalizationRule { keyword: "c57bl6", normalized_value: "C57BL/6" },
            ],
        },
        FieldSchema {
            field_name: "identifier",
            description: "Unique identifier for this NWB file",
            required: false,
            list_valued: false,
            normalization_rules: &[],
        },
        FieldSchema {
            field_name: "session_start_time",
            description: "ISO 8601 timestamp the recording session started",
            required: false,
            list_valued: false,
            normalization_rules: &[],
        },
    ]
});

/// Look up a field by name. Returns `None` for unrecognized fields (the
/// dialogue worker discards `ParsedField`s that don't resolve here.
pub fn lookup(field_name: &str) -> Option<&'static FieldSchema> {
    FIELD_SCHEMA.iter().find(|f| f.field_name == field_name)
}

/// Names of fields marked `required: true`.
pub fn required_fields() -> impl Iterator<Item = &'static str> {
    FIELD_SCHEMA.iter().filter(|f| f.required).map(|f| f.field_name)
}
