// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM-assisted metadata extraction with rule-based fallback.

use std::sync::Arc;

use nwb_adapters::{LlmClient, LlmRequest};
use nwb_core::schema::FIELD_SCHEMA;
use nwb_core::{ParsedField, Session};
use serde::Deserialize;

use crate::rule_based;

#[derive(Deserialize)]
struct FieldsEnvelope {
    fields: Vec<ParsedField>,
}

/// Wraps an `Arc<dyn LlmClient>` and the field-schema registry to turn free
/// text into a list of [`ParsedField`]s. Never fails: on any LLM error or
/// unparseable completion it degrades to [`rule_based::extract`].
pub struct MetadataExtractor {
    llm: Arc<dyn LlmClient>,
}

impl MetadataExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn extract(&self, session: &Session, message: &str) -> Vec<ParsedField> {
        let system = build_system_prompt(session);
        match self.llm.complete(LlmRequest::new(system, message.to_string())).await {
            Ok(raw) => match parse_fields_envelope(&raw) {
                Some(fields) => fields
                    .into_iter()
                    .filter(|f| nwb_core::schema::lookup(&f.field_name).is_some())
                    .collect(),
                None => {
                    tracing::warn!("LLM returned unparseable metadata extraction output; falling back to rules");
                    rule_based::extract(message)
                }
            },
            Err(error) => {
                tracing::warn!(%error, "LLM metadata extraction unavailable; falling back to rules");
                rule_based::extract(message)
            }
        }
    }
}

/// Parses `{"fields": [...]}`, tolerating a bare JSON array too (some models
/// omit the envelope).
fn parse_fields_envelope(raw: &str) -> Option<Vec<ParsedField>> {
    if let Ok(envelope) = serde_json::from_str::<FieldsEnvelope>(raw) {
        return Some(envelope.fields);
    }
    serde_json::from_str::<Vec<ParsedField>>(raw).ok()
}

fn build_system_prompt(session: &Session) -> String {
    let schema_json: Vec<_> = FIELD_SCHEMA
        .iter()
        .map(|f| {
            serde_json::json!({
                "field_name": f.field_name,
                "description": f.description,
                "required": f.required,
                "list_valued": f.list_valued,
            })
        })
        .collect();

    let already_collected: Vec<_> = session.user_metadata.keys().cloned().collect();

    format!(
        "You extract NWB/DANDI metadata fields from a user's free-text message. \
         Recognized fields: {}. Already collected: {:?}. \
         Respond with a JSON object of the shape {{\"fields\": [{{\"field_name\", \"raw_input\", \
         \"normalized_value\", \"confidence\" (0-100), \"reasoning\", \"needs_review\", \"alternatives\"}}]}}. \
         Only include fields you can confidently extract from the message; omit everything else.",
        serde_json::to_string(&schema_json).unwrap_or_default(),
        already_collected,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwb_adapters::FakeLlmClient;

    fn session() -> Session {
        Session::new()
    }

    #[tokio::test]
    async fn extracts_fields_from_well_formed_llm_json() {
        let reply = serde_json::json!({
            "fields": [{
                "field_name": "species",
                "raw_input": "8 week old male mice",
                "normalized_value": "Mus musculus",
                "confidence": 92,
                "reasoning": "explicit mention of mice",
                "needs_review": false,
                "alternatives": [],
            }]
        })
        .to_string();
        let extractor = MetadataExtractor::new(Arc::new(FakeLlmClient::new(vec![Ok(reply)])));

        let fields = extractor.extract(&session(), "8 week old male mice").await;
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name, "species");
        assert_eq!(fields[0].confidence, 92);
    }

    #[tokio::test]
    async fn discards_fields_not_in_the_schema() {
        let reply = serde_json::json!({
            "fields": [{
                "field_name": "favorite_color",
                "raw_input": "blue",
                "normalized_value": "blue",
                "confidence": 99,
                "reasoning": "x",
                "needs_review": false,
                "alternatives": [],
            }]
        })
        .to_string();
        let extractor = MetadataExtractor::new(Arc::new(FakeLlmClient::new(vec![Ok(reply)])));

        let fields = extractor.extract(&session(), "blue").await;
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_rule_based_on_llm_failure() {
        let extractor = MetadataExtractor::new(Arc::new(FakeLlmClient::always_unavailable()));
        let fields = extractor.extract(&session(), "adult male mouse").await;
        assert!(fields.iter().any(|f| f.field_name == "sex"));
    }

    #[tokio::test]
    async fn falls_back_to_rule_based_on_unparseable_llm_output() {
        let extractor = MetadataExtractor::new(Arc::new(FakeLlmClient::new(vec![Ok("not json at all".to_string())])));
        let fields = extractor.extract(&session(), "adult male mouse").await;
        assert!(fields.iter().any(|f| f.field_name == "age"));
    }
}
