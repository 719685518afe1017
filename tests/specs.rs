// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios driven through the real `axum` router with the
//! three external collaborators replaced by their test-support fakes.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use nwb_adapters::{FakeConversionLibrary, FakeLlmClient, FakeNwbValidator, NullLlmClient};
use nwb_core::{Severity, ValidationIssue};
use nwb_server::{build_router, AppState};

struct Harness {
    state: AppState,
    conversion_library: Arc<FakeConversionLibrary>,
    validator: Arc<FakeNwbValidator>,
    extractor_llm: Arc<FakeLlmClient>,
    upload_dir: PathBuf,
    #[allow(dead_code)]
    output_dir: PathBuf,
}

fn harness() -> Harness {
    harness_with_max_retries(5)
}

fn harness_with_max_retries(max_retry_attempts: u32) -> Harness {
    let upload_dir = tempfile::tempdir().unwrap().into_path();
    let output_dir = tempfile::tempdir().unwrap().into_path();

    let conversion_library = Arc::new(FakeConversionLibrary::new());
    let validator = Arc::new(FakeNwbValidator::new(vec![]));
    let extractor_llm = Arc::new(FakeLlmClient::new(vec![]));

    let state = AppState::assemble_for_test(
        max_retry_attempts,
        upload_dir.clone(),
        output_dir.clone(),
        conversion_library.clone(),
        validator.clone(),
        Arc::new(NullLlmClient),
        Arc::new(NullLlmClient),
        extractor_llm.clone(),
    )
    .unwrap();

    Harness { state, conversion_library, validator, extractor_llm, upload_dir, output_dir }
}

fn multipart_body(boundary: &str, field_name: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field_name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn multipart_body_two_files(
    boundary: &str,
    primary_filename: &str,
    primary_content: &[u8],
    additional_field_name: &str,
    additional_filename: &str,
    additional_content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{primary_filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(primary_content);
    body.extend_from_slice(
        format!(
            "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"{additional_field_name}\"; filename=\"{additional_filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(additional_content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn send(h: &Harness, req: Request<Body>) -> (StatusCode, Value) {
    let router = build_router(h.state.clone());
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn upload_spikeglx_recording(h: &Harness) -> Value {
    let boundary = "nwb-test-boundary";
    let body = multipart_body(boundary, "file", "Noise4Sam_g0_t0.imec0.ap.bin", b"fake spikeglx bytes");
    // `detect_format` inspects the upload directory's contents — write the
    // sibling `.meta` file straight to disk, the way a real multi-file
    // SpikeGLX upload would end up laid out.
    std::fs::write(h.upload_dir.join("Noise4Sam_g0_t0.imec0.ap.meta"), b"").unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let (status, value) = send(h, request).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {value:?}");
    value
}

// Additional files of an incompatible format are rejected at upload time.
#[tokio::test]
async fn upload_rejects_an_additional_file_of_a_mismatched_format() {
    let h = harness();
    let boundary = "nwb-test-boundary";
    let body = multipart_body_two_files(
        boundary,
        "Noise4Sam_g0_t0.imec0.ap.bin",
        b"fake spikeglx bytes",
        "additional_files",
        "structure.oebin",
        b"{}",
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let (status, value) = send(&h, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "expected rejection, got: {value:?}");
}

// An additional file matching the primary recording's format is accepted.
#[tokio::test]
async fn upload_accepts_an_additional_file_of_the_same_format() {
    let h = harness();
    let boundary = "nwb-test-boundary";
    let body = multipart_body_two_files(
        boundary,
        "Noise4Sam_g0_t0.imec0.ap.bin",
        b"fake spikeglx bytes",
        "additional_files",
        "Noise4Sam_g0_t0.imec0.ap.meta",
        b"",
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let (status, value) = send(&h, request).await;
    assert_eq!(status, StatusCode::OK, "upload should have succeeded: {value:?}");
}

async fn start_conversion(h: &Harness) -> Value {
    let request = Request::builder().method("POST").uri("/api/start-conversion").body(Body::empty()).unwrap();
    let (status, value) = send(h, request).await;
    assert_eq!(status, StatusCode::OK, "start-conversion failed: {value:?}");
    value
}

async fn chat(h: &Harness, message: &str) -> Value {
    let body = format!("message={}", urlencoding_encode(message));
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let (status, value) = send(h, request).await;
    assert_eq!(status, StatusCode::OK, "chat failed: {value:?}");
    value
}

async fn retry_approval(h: &Harness, decision: &str) -> Value {
    let body = format!("decision={decision}");
    let request = Request::builder()
        .method("POST")
        .uri("/api/retry-approval")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let (status, value) = send(h, request).await;
    assert_eq!(status, StatusCode::OK, "retry-approval failed: {value:?}");
    value
}

async fn improvement_decision(h: &Harness, decision: &str) -> Value {
    let body = format!("decision={decision}");
    let request = Request::builder()
        .method("POST")
        .uri("/api/improvement-decision")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let (status, value) = send(h, request).await;
    assert_eq!(status, StatusCode::OK, "improvement-decision failed: {value:?}");
    value
}

async fn status(h: &Harness) -> Value {
    let request = Request::builder().method("GET").uri("/api/status").body(Body::empty()).unwrap();
    let (status_code, value) = send(h, request).await;
    assert_eq!(status_code, StatusCode::OK);
    value
}

async fn reset(h: &Harness) -> Value {
    let request = Request::builder().method("POST").uri("/api/reset").body(Body::empty()).unwrap();
    let (status_code, value) = send(h, request).await;
    assert_eq!(status_code, StatusCode::OK);
    value
}

/// Minimal percent-encoding sufficient for the free-text messages these
/// scenarios send (spaces and a handful of punctuation marks).
fn urlencoding_encode(input: &str) -> String {
    let mut out = String::new();
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

fn scripted_fields_reply(fields: &[(&str, &str, u8)]) -> String {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(name, value, confidence)| {
            serde_json::json!({
                "field_name": name,
                "raw_input": value,
                "normalized_value": value,
                "confidence": confidence,
                "reasoning": "test fixture",
                "needs_review": *confidence < 50,
                "alternatives": [],
            })
        })
        .collect();
    serde_json::json!({ "fields": fields }).to_string()
}

fn critical_issue() -> ValidationIssue {
    ValidationIssue { severity: Severity::Critical, check_name: "check_missing_subject".into(), message: "subject is missing".into(), location: "/general/subject".into(), suggested_fix: None }
}

fn warning_issue() -> ValidationIssue {
    ValidationIssue { severity: Severity::Warning, check_name: "check_units".into(), message: "units missing".into(), location: "/acquisition".into(), suggested_fix: None }
}

// S1: happy path with batch natural-language metadata.
#[tokio::test]
async fn s1_happy_path_with_batch_metadata() {
    let h = harness();
    upload_spikeglx_recording(&h).await;
    start_conversion(&h).await;

    h.extractor_llm.push_reply(Ok(scripted_fields_reply(&[
        ("experimenter", "Smith, Jane", 95),
        ("institution", "Massachusetts Institute of Technology", 95),
        ("session_description", "Noise recording session", 90),
        ("species", "Mus musculus", 95),
        ("age", "P56D", 90),
        ("sex", "M", 95),
    ])));

    chat(&h, "I'm Dr. Jane Smith from MIT studying 8 week old male C57BL/6 mice").await;

    let snapshot = status(&h).await;
    assert_eq!(snapshot["status"], "completed");
    let outcome = snapshot["validation_outcome"].as_str().unwrap();
    assert!(outcome == "passed" || outcome == "passed_with_issues", "unexpected outcome: {outcome}");

    let metadata = &snapshot["user_metadata"];
    assert_eq!(metadata["experimenter"], "Smith, Jane");
    assert_eq!(metadata["institution"], "Massachusetts Institute of Technology");
    assert_eq!(metadata["age"], "P56D");
    assert_eq!(metadata["sex"], "M");
    assert_eq!(metadata["species"], "Mus musculus");

    assert!(snapshot["output_checksum"].as_str().unwrap().len() == 64);
}

// S2: low-confidence deferred warning.
#[tokio::test]
async fn s2_low_confidence_field_is_applied_and_flagged() {
    let h = harness();
    upload_spikeglx_recording(&h).await;
    start_conversion(&h).await;

    h.extractor_llm.push_reply(Ok(scripted_fields_reply(&[
        ("experimenter", "Smith, Jane", 95),
        ("institution", "Massachusetts Institute of Technology", 95),
        ("session_description", "Noise recording session", 90),
        ("species", "Mus musculus", 95),
        ("sex", "M", 95),
        ("age", "P90D", 30),
    ])));

    chat(&h, "adult").await;

    let snapshot = status(&h).await;
    assert_eq!(snapshot["user_metadata"]["age"], "P90D");
    let warning = &snapshot["metadata_warnings"]["age"];
    assert!(warning["confidence"].as_u64().unwrap() < 50);
    assert_eq!(warning["value"], "P90D");

    // A later confirming message resolves the pending low-confidence guess;
    // the already-applied value is untouched.
    chat(&h, "yes that's right").await;
    let snapshot = status(&h).await;
    assert_eq!(snapshot["user_metadata"]["age"], "P90D");
    assert!(snapshot["metadata_warnings"].as_object().unwrap().is_empty());
}

// S3: skip intent.
#[tokio::test]
async fn s3_skip_intent_proceeds_without_a_second_request() {
    let h = harness();
    h.validator.set_issues(vec![warning_issue()]);
    upload_spikeglx_recording(&h).await;
    start_conversion(&h).await;

    let reply = chat(&h, "skip").await;
    assert_eq!(reply["status"], "awaiting_improvement_decision");

    let snapshot = status(&h).await;
    assert_eq!(snapshot["metadata_policy"], "user_declined");
    assert_eq!(snapshot["status"], "awaiting_improvement_decision");
    assert_eq!(snapshot["validation_outcome"], "passed_with_issues");
    // Only one user turn was ever appended; no second metadata request round.
    let user_turns = snapshot["conversation_history"].as_array().unwrap().iter().filter(|m| m["role"] == "user").count();
    assert_eq!(user_turns, 1);

    let decision_reply = improvement_decision(&h, "accept").await;
    assert_eq!(decision_reply["status"], "completed");
    let final_snapshot = status(&h).await;
    assert_eq!(final_snapshot["validation_status"], "passed_accepted");
}

// S4: validation failed, retry approved, then succeeded.
#[tokio::test]
async fn s4_retry_approved_then_succeeds() {
    let h = harness();
    h.validator.set_issues(vec![critical_issue()]);
    upload_spikeglx_recording(&h).await;
    start_conversion(&h).await;
    let reply = chat(&h, "skip").await;
    assert_eq!(reply["status"], "awaiting_retry_approval");

    let first_snapshot = status(&h).await;
    let first_output = PathBuf::from(first_snapshot["output_path"].as_str().unwrap());
    let first_checksum = first_snapshot["output_checksum"].as_str().unwrap().to_string();
    assert!(first_output.ends_with("Noise4Sam_g0_t0.imec0.ap.nwb"));

    h.validator.set_issues(vec![]);
    let reply = retry_approval(&h, "approve").await;
    assert_eq!(reply["status"], "completed");

    let snapshot = status(&h).await;
    assert_eq!(snapshot["correction_attempt"], 1);
    assert_eq!(snapshot["validation_status"], "passed_improved");
    let second_output = PathBuf::from(snapshot["output_path"].as_str().unwrap());
    assert!(second_output.ends_with("Noise4Sam_g0_t0.imec0.ap_v2.nwb"));

    // The original v1 artifact is untouched and still checksums the same.
    let still_there_checksum = nwb_adapters::sha256_file(&first_output).unwrap();
    assert_eq!(still_there_checksum, first_checksum);
}

// S5: retry limit exceeded.
#[tokio::test]
async fn s5_retry_limit_exceeded_goes_directly_to_failed() {
    let h = harness_with_max_retries(5);
    h.validator.set_issues(vec![critical_issue()]);
    upload_spikeglx_recording(&h).await;
    start_conversion(&h).await;
    let reply = chat(&h, "skip").await;
    assert_eq!(reply["status"], "awaiting_retry_approval");

    // Five approvals, each re-converting and failing again: correction_attempt
    // climbs 1..=5 and the session stays in AWAITING_RETRY_APPROVAL.
    for expected_attempt in 1..=5u64 {
        let reply = retry_approval(&h, "approve").await;
        assert_eq!(reply["status"], "awaiting_retry_approval", "attempt {expected_attempt}");
        let snapshot = status(&h).await;
        assert_eq!(snapshot["correction_attempt"], expected_attempt);
        assert_eq!(snapshot["can_retry"].as_bool().unwrap(), expected_attempt < 5, "attempt {expected_attempt}");
    }

    let conversions_before = h.conversion_library.calls();

    // The sixth would-be retry: can_retry() is false, so the worker must go
    // straight to FAILED without issuing another run_conversion call.
    let reply = retry_approval(&h, "approve").await;
    assert_eq!(reply["status"], "failed");

    let snapshot = status(&h).await;
    assert_eq!(snapshot["status"], "failed");
    assert_eq!(snapshot["correction_attempt"], 5);
    assert_eq!(h.conversion_library.calls(), conversions_before, "no further run_conversion call should have been issued");
}

// S6: session reset preserves no state.
#[tokio::test]
async fn s6_reset_clears_policy_and_conversation_history() {
    let h = harness();
    h.validator.set_issues(vec![warning_issue()]);
    upload_spikeglx_recording(&h).await;
    start_conversion(&h).await;
    chat(&h, "skip").await;

    let completed = status(&h).await;
    assert_eq!(completed["metadata_policy"], "user_declined");
    assert!(!completed["conversation_history"].as_array().unwrap().is_empty());

    reset(&h).await;

    let fresh = status(&h).await;
    assert_eq!(fresh["status"], "idle");
    assert_eq!(fresh["metadata_policy"], "not_requested");
    assert!(fresh["conversation_history"].as_array().unwrap().is_empty());

    upload_spikeglx_recording(&h).await;
    let reply = start_conversion(&h).await;
    assert_eq!(reply["status"], "awaiting_user_input");
    assert!(reply["message"].as_str().unwrap().len() > 0);

    let snapshot = status(&h).await;
    assert_eq!(snapshot["metadata_policy"], "asked_once");
}

// Invariant property: a second `/api/chat` request arriving while a call is
// already in flight is refused as `busy` rather than racing it.
#[tokio::test]
async fn busy_chat_request_leaves_conversation_history_unchanged() {
    let h = harness();
    upload_spikeglx_recording(&h).await;
    start_conversion(&h).await;

    h.state.store.acquire_llm_slot().expect("slot should be free");
    let before = status(&h).await;
    let before_len = before["conversation_history"].as_array().unwrap().len();

    let reply = chat(&h, "should not be consumed").await;
    assert_eq!(reply["status"], "busy");

    let after = status(&h).await;
    assert_eq!(after["conversation_history"].as_array().unwrap().len(), before_len);

    h.state.store.release_llm_slot();
}
