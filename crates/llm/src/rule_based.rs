// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The regex/keyword fallback extractor, driven by the schema's
//! `normalization_rules` table. Used whenever the LLM
//! call fails or returns unparseable output. Degraded parsing produces lower
//! confidences than the LLM path: at most 75 for a keyword-rule match, at
//! most 60 for a literal `field: value` extraction.
use nwb_core::schema::FIELD_SCHEMA;
use nwb_core::ParsedField;
use regex::Regex;

const KEYWORD_RULE_CONFIDENCE: u8 = 75;
const LITERAL_KEY_VALUE_CONFIDENCE: u8 = 60;

/// Extract whatever fields can be recognized from free text without LLM
/// assistance: first a literal `field_name: value` scan (highest-precedence,
/// still capped below the LLM path), then a keyword/phrase scan against each
/// field's normalization rules.
pub fn extract(text: &str) -> Vec<ParsedField> {
    let mut fields: Vec<ParsedField> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for field in FIELD_SCHEMA.iter() {
        if let Some(value) = extract_literal_key_value(text, field.field_name) {
            fields.push(ParsedField {
                field_name: field.field_name.to_string(),
                raw_input: text.to_string(),
                normalized_value: value,
                confidence: LITERAL_KEY_VALUE_CONFIDENCE,
                reasoning: "literal key:value extraction (rule-based fallback)".to_string(),
                needs_review: false,
                alternatives: Vec::new(),
            });
            seen.insert(field.field_name);
        }
    }

    for field in FIELD_SCHEMA.iter() {
        if seen.contains(field.field_name) {
            continue;
        }
        let lower = text.to_lowercase();
        if let Some(rule) = field.normalization_rules.iter().find(|r| lower.contains(r.keyword)) {
            fields.push(ParsedField {
                field_name: field.field_name.to_string(),
                raw_input: text.to_string(),
                normalized_value: rule.normalized_value.to_string(),
                confidence: KEYWORD_RULE_CONFIDENCE,
                reasoning: format!("matched keyword \"{}\" via rule-based fallback", rule.keyword),
                needs_review: false,
                alternatives: Vec::new(),
            });
            seen.insert(field.field_name);
        }
    }

    fields
}

/// Looks for `field_name: value` or `field_name = value` (case-insensitive),
/// stopping at the next comma/semicolon/newline.
fn extract_literal_key_value(text: &str, field_name: &str) -> Option<String> {
    let pattern = format!(r"(?i){}\s*[:=]\s*([^,;\n]+)", regex::escape(field_name));
    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(text)?;
    Some(captures.get(1)?.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_literal_key_value_pairs() {
        let fields = extract("age: P56D, sex: M");
        let age = fields.iter().find(|f| f.field_name == "age").unwrap();
        assert_eq!(age.normalized_value, "P56D");
        assert_eq!(age.confidence, LITERAL_KEY_VALUE_CONFIDENCE);
    }

    #[test]
    fn applies_keyword_normalization_rules() {
        let fields = extract("the subject is an adult male mouse");
        let age = fields.iter().find(|f| f.field_name == "age").unwrap();
        assert_eq!(age.normalized_value, "P90D");
        let sex = fields.iter().find(|f| f.field_name == "sex").unwrap();
        assert_eq!(sex.normalized_value, "M");
        let species = fields.iter().find(|f| f.field_name == "species").unwrap();
        assert_eq!(species.normalized_value, "Mus musculus");
        assert!(fields.iter().all(|f| f.confidence <= KEYWORD_RULE_CONFIDENCE));
    }

    #[test]
    fn literal_extraction_takes_precedence_over_keyword_rules_for_same_field() {
        let fields = extract("age: adult, the mouse is adult");
        let age_matches: Vec<_> = fields.iter().filter(|f| f.field_name == "age").collect();
        assert_eq!(age_matches.len(), 1);
        assert_eq!(age_matches[0].confidence, LITERAL_KEY_VALUE_CONFIDENCE);
    }

    #[test]
    fn unrecognized_text_yields_no_fields() {
        assert!(extract("the weather is nice today").is_empty());
    }
}
