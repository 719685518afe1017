// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt generation for metadata requests and status messages. Every
//! generator has a fixed-template fallback so the system stays functional
//! with the LLM disabled.

use nwb_adapters::{LlmClient, LlmRequest};
use nwb_core::Session;

/// Fixed-template acknowledgment of an upload (`handle_upload`).
pub fn upload_acknowledgment_template(filename: &str, size_bytes: u64) -> String {
    format!(
        "Got your file `{filename}` ({size_bytes} bytes). I'll start the conversion once you say the word \u{2014} \
         send anything to begin, and I'll ask a few questions about the recording along the way."
    )
}

/// Fixed-template request for missing metadata fields.
pub fn metadata_request_template(detected_format: Option<&str>, missing_fields: &[&str]) -> String {
    let format_clause = detected_format.map(|f| format!("This looks like a {f} recording. ")).unwrap_or_default();
    format!(
        "{format_clause}Before I convert this to NWB, could you tell me about: {}? \
         You can answer in plain language, or say \"skip\" to proceed with whatever I can infer.",
        missing_fields.join(", ")
    )
}

/// Fixed-template explanation of a terminal failure.
pub fn failure_explanation_template(error: &str) -> String {
    format!(
        "The conversion could not complete: {error}. Any partial output remains available for download, \
         and you can ask me to retry if you'd like to adjust the metadata first."
    )
}

/// Fixed-template summary of a validation outcome.
pub fn validation_summary_template(outcome: &str, issue_count: usize) -> String {
    match issue_count {
        0 => format!("Validation finished: {outcome}, with no issues found."),
        1 => format!("Validation finished: {outcome}, with 1 issue to review."),
        n => format!("Validation finished: {outcome}, with {n} issues to review."),
    }
}

/// Request an LLM-generated metadata prompt, falling back to the fixed
/// template on any `LlmError` or empty completion.
pub async fn generate_metadata_request(
    llm: &dyn LlmClient,
    session: &Session,
    missing_fields: &[&str],
) -> String {
    let system = format!(
        "You are a neurophysiology data conversion assistant. Write one short, friendly message asking the \
         user for the following NWB metadata fields: {}. Detected format: {}. Keep it to 2-3 sentences.",
        missing_fields.join(", "),
        session.detected_format.as_deref().unwrap_or("unknown"),
    );
    let history_tail = conversation_tail(session, 4);

    match llm.complete(LlmRequest::new(system, history_tail)).await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => metadata_request_template(session.detected_format.as_deref(), missing_fields),
    }
}

/// Request an LLM-generated failure explanation, falling back to the fixed
/// template.
pub async fn generate_failure_explanation(llm: &dyn LlmClient, error: &str) -> String {
    let system = "You are a neurophysiology data conversion assistant. Explain this failure to a non-expert \
                  user in 2-3 sentences, without jargon, and mention that a retry may be offered."
        .to_string();
    match llm.complete(LlmRequest::new(system, error.to_string())).await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => failure_explanation_template(error),
    }
}

fn conversation_tail(session: &Session, n: usize) -> String {
    session
        .conversation_history
        .iter()
        .rev()
        .take(n)
        .rev()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwb_adapters::FakeLlmClient;

    #[test]
    fn upload_template_mentions_filename_and_size() {
        let msg = upload_acknowledgment_template("recording.bin", 1024);
        assert!(msg.contains("recording.bin"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn metadata_request_template_lists_missing_fields() {
        let msg = metadata_request_template(Some("SpikeGLX"), &["age", "sex"]);
        assert!(msg.contains("SpikeGLX"));
        assert!(msg.contains("age"));
        assert!(msg.contains("sex"));
    }

    #[tokio::test]
    async fn generate_metadata_request_falls_back_on_llm_error() {
        let llm = FakeLlmClient::always_unavailable();
        let session = Session::new();
        let msg = generate_metadata_request(&llm, &session, &["species"]).await;
        assert!(msg.contains("species"));
    }

    #[tokio::test]
    async fn generate_metadata_request_uses_llm_output_when_available() {
        let llm = FakeLlmClient::new(vec![Ok("Could you share the subject species?".to_string())]);
        let session = Session::new();
        let msg = generate_metadata_request(&llm, &session, &["species"]).await;
        assert_eq!(msg, "Could you share the subject species?");
    }
}
