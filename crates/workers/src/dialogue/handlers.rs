// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Dialogue Worker's public contract and the internal
//! conversion/validation pipeline it drives.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use nwb_core::clock::Clock;
use nwb_core::{ConversationRole, LogSeverity, MetadataPolicy, Session, SessionStatus, ValidationOutcome, ValidationReport, ValidationStatus, WorkflowStep, WorkflowTrace};
use serde_json::json;

use super::{policy, DialogueError, DialogueReply, DialogueWorker, HandleMessageOutcome, ProcessingGuard};
use crate::conversion as conversion_worker;
use crate::dialogue::metadata as metadata_policy;
use crate::evaluation as evaluation_worker;

impl<C: Clock> DialogueWorker<C> {
    /// `handle_upload(path)`: records `input_path`, transitions to
    /// UPLOAD_ACKNOWLEDGED, generates a greeting.
    pub async fn handle_upload(&self, path: PathBuf, size_bytes: u64) -> Result<DialogueReply, DialogueError> {
        self.store.set_input(path.clone());
        self.store.transition(SessionStatus::UploadAcknowledged)?;
        self.events.status_change(SessionStatus::UploadAcknowledged);

        let filename = path.file_name().map(|f| f.to_string_lossy().to_string()).unwrap_or_else(|| "upload".to_string());
        let message = nwb_llm::prompts::upload_acknowledgment_template(&filename, size_bytes);
        self.store.append_message(ConversationRole::Assistant, message.clone());
        self.events.assistant_message(&message);

        Ok(DialogueReply {
            message,
            status: SessionStatus::UploadAcknowledged,
            ready_to_proceed: false,
            needs_more_info: false,
            extracted_metadata: HashMap::new(),
        })
    }

    /// `handle_start_conversion()`: begins dialogue or proceeds directly if
    /// metadata is already sufficient.
    pub async fn handle_start_conversion(&self) -> Result<DialogueReply, DialogueError> {
        self.store.transition(SessionStatus::AwaitingUserInput)?;
        self.events.status_change(SessionStatus::AwaitingUserInput);

        let session = self.store.snapshot();
        if policy::should_request_metadata(&session) {
            self.ask_for_metadata(&session).await
        } else {
            self.run_full_pipeline().await
        }
    }

    /// `handle_user_message(text)`: the main extraction/decision entry
    /// point. Reports `busy` without consuming the message if a call is
    /// already in flight.
    pub async fn handle_user_message(&self, text: &str) -> Result<HandleMessageOutcome, DialogueError> {
        if self.store.acquire_llm_slot().is_err() {
            return Ok(HandleMessageOutcome::Busy);
        }
        let _guard = ProcessingGuard { store: self.store.as_ref() };
        let reply = self.process_user_message(text).await?;
        Ok(HandleMessageOutcome::Reply(reply))
    }

    /// `handle_retry_decision(approve)`: out of AWAITING_RETRY_APPROVAL.
    pub async fn handle_retry_decision(&self, approve: bool) -> Result<DialogueReply, DialogueError> {
        let session = self.store.snapshot();
        if session.status != SessionStatus::AwaitingRetryApproval {
            return Err(DialogueError::InvalidDecision("no retry decision is pending".to_string()));
        }

        if !approve {
            self.store.set_validation_status(ValidationStatus::FailedUserDeclined);
            self.store.transition(SessionStatus::Completed)?;
            self.events.status_change(SessionStatus::Completed);
            return self.emit_terminal_message(
                "Understood — stopping here. The most recent output and reports remain available for download.",
                SessionStatus::Completed,
                &session,
            );
        }

        if !self.store.can_retry() {
            self.store.transition(SessionStatus::Failed)?;
            self.events.status_change(SessionStatus::Failed);
            return self.emit_terminal_message(
                "The retry limit has been reached; no further attempts are possible.",
                SessionStatus::Failed,
                &session,
            );
        }

        self.store.increment_correction_attempt()?;
        self.store.transition(SessionStatus::Converting)?;
        self.events.status_change(SessionStatus::Converting);
        let session = self.store.snapshot();
        self.run_conversion_and_validate(&session).await
    }

    /// `handle_improvement_decision(accept)`: out of AWAITING_IMPROVEMENT_DECISION.
    pub async fn handle_improvement_decision(&self, accept: bool) -> Result<DialogueReply, DialogueError> {
        let session = self.store.snapshot();
        if session.status != SessionStatus::AwaitingImprovementDecision {
            return Err(DialogueError::InvalidDecision("no improvement decision is pending".to_string()));
        }

        if accept {
            self.store.set_validation_status(ValidationStatus::PassedAccepted);
            self.store.transition(SessionStatus::Completed)?;
            self.events.status_change(SessionStatus::Completed);
            return self.emit_terminal_message("Great — accepting the current output as final.", SessionStatus::Completed, &session);
        }

        self.store.increment_correction_attempt()?;
        self.store.transition(SessionStatus::Converting)?;
        self.events.status_change(SessionStatus::Converting);
        let session = self.store.snapshot();
        self.run_conversion_and_validate(&session).await
    }

    async fn process_user_message(&self, text: &str) -> Result<DialogueReply, DialogueError> {
        self.store.append_message(ConversationRole::User, text.to_string());
        let session = self.store.snapshot();

        if nwb_llm::intent::is_skip_intent(text) {
            self.store.set_metadata_policy(MetadataPolicy::UserDeclined);
            self.store.append_log(LogSeverity::Info, "user declined further metadata collection".to_string());
        } else if nwb_llm::intent::is_confirmation(text) {
            if !session.metadata_warnings.is_empty() {
                let confirmed = self.store.confirm_metadata_warnings();
                self.store.append_log(LogSeverity::Info, format!("user confirmed pending field(s): {}", confirmed.join(", ")));
            }
        } else {
            let fields = self.extractor.extract(&session, text).await;
            metadata_policy::apply_parsed_fields(&self.store, &fields);
        }

        let session = self.store.snapshot();
        if session.status != SessionStatus::AwaitingUserInput {
            return Ok(DialogueReply {
                message: "Got it.".to_string(),
                status: session.status,
                ready_to_proceed: false,
                needs_more_info: false,
                extracted_metadata: session.user_metadata,
            });
        }

        if policy::should_request_metadata(&session) {
            return self.ask_for_metadata(&session).await;
        }

        if !policy::missing_required_fields(&session).is_empty() && session.metadata_policy == MetadataPolicy::AskedOnce {
            self.store.set_metadata_policy(MetadataPolicy::ProceedingMinimal);
        }

        self.run_full_pipeline().await
    }

    async fn ask_for_metadata(&self, session: &Session) -> Result<DialogueReply, DialogueError> {
        self.store.set_metadata_policy(MetadataPolicy::AskedOnce);
        let missing = policy::missing_required_fields(session);
        let message = nwb_llm::prompts::generate_metadata_request(self.llm.as_ref(), session, &missing).await;
        self.store.append_message(ConversationRole::Assistant, message.clone());
        self.events.assistant_message(&message);
        Ok(DialogueReply {
            message,
            status: session.status,
            ready_to_proceed: false,
            needs_more_info: true,
            extracted_metadata: session.user_metadata.clone(),
        })
    }

    fn emit_terminal_message(&self, message: &str, status: SessionStatus, session: &Session) -> Result<DialogueReply, DialogueError> {
        self.store.append_message(ConversationRole::Assistant, message.to_string());
        self.events.assistant_message(message);
        Ok(DialogueReply {
            message: message.to_string(),
            status,
            ready_to_proceed: status == SessionStatus::Completed,
            needs_more_info: false,
            extracted_metadata: session.user_metadata.clone(),
        })
    }

    /// Drives IDLE→...→DETECTING_FORMAT→CONVERTING from AWAITING_USER_INPUT:
    /// detect the format, then hand off to the shared conversion/validation
    /// pipeline.
    async fn run_full_pipeline(&self) -> Result<DialogueReply, DialogueError> {
        self.store.transition(SessionStatus::DetectingFormat)?;
        self.events.status_change(SessionStatus::DetectingFormat);

        let session = self.store.snapshot();
        let input_path = session
            .input_path
            .clone()
            .ok_or_else(|| DialogueError::InvalidDecision("no input file has been uploaded".to_string()))?;

        let reply = self
            .bus
            .send(conversion_worker::WORKER_NAME, conversion_worker::ACTION_DETECT_FORMAT, session.clone(), json!({}))
            .await?;
        let (format, confidence) = match reply.data {
            Some(data) if reply.success => (
                data.get("format").and_then(|v| v.as_str()).unwrap_or("Unknown").to_string(),
                data.get("confidence").and_then(|v| v.as_u64()).unwrap_or(0),
            ),
            _ => ("Unknown".to_string(), 0),
        };
        self.store.set_detected_format(format.clone());
        self.store.append_log(LogSeverity::Info, format!("Detected format: {format} (confidence {confidence})"));

        self.store.transition(SessionStatus::Converting)?;
        self.events.status_change(SessionStatus::Converting);

        let session = self.store.snapshot();
        self.run_conversion_and_validate(&session).await
    }

    /// Shared CONVERTING→VALIDATING→{terminal/decision} pipeline, used by
    /// the initial pipeline and by every retry/improvement re-entry.
    /// Assumes the store is already in `Converting` with `detected_format`
    /// set.
    async fn run_conversion_and_validate(&self, session: &Session) -> Result<DialogueReply, DialogueError> {
        let input_path = session
            .input_path
            .clone()
            .ok_or_else(|| DialogueError::InvalidDecision("no input file has been uploaded".to_string()))?;
        let format = session.detected_format.clone().unwrap_or_else(|| "Unknown".to_string());
        let conversion_started_ms = self.store.epoch_ms();
        let step_started_at = Instant::now();

        let conversion_reply = self
            .bus
            .send(conversion_worker::WORKER_NAME, conversion_worker::ACTION_RUN_CONVERSION, session.clone(), json!({}))
            .await?;

        match conversion_reply.data.filter(|_| conversion_reply.success) {
            Some(data) => {
                let output_path = PathBuf::from(data.get("output_path").and_then(|v| v.as_str()).unwrap_or_default());
                let checksum = data.get("checksum").and_then(|v| v.as_str()).unwrap_or_default().to_string();

                self.store.set_output(output_path.clone(), checksum.clone());
                self.store.append_log(LogSeverity::Info, "conversion succeeded".to_string());
                self.events.progress(100, "conversion complete");

                self.store.transition(SessionStatus::Validating)?;
                self.events.status_change(SessionStatus::Validating);

                let trace = WorkflowTrace {
                    input_path: input_path.display().to_string(),
                    input_checksum: None,
                    detected_format: session.detected_format.clone(),
                    steps: vec![WorkflowStep {
                        ordinal: 1,
                        description: format!("Converted {format} recording to NWB"),
                        duration_seconds: step_started_at.elapsed().as_secs_f64(),
                    }],
                    technologies: HashMap::new(),
                    parameters: HashMap::new(),
                    output_path: output_path.display().to_string(),
                    output_checksum: checksum.clone(),
                    started_at_ms: conversion_started_ms,
                    duration_seconds: 0.0,
                };

                let validation_session = self.store.snapshot();
                let validation_reply = self
                    .bus
                    .send(
                        evaluation_worker::WORKER_NAME,
                        evaluation_worker::ACTION_RUN_VALIDATION,
                        validation_session,
                        json!({ "trace": trace }),
                    )
                    .await?;

                let validation_data = validation_reply
                    .data
                    .filter(|_| validation_reply.success)
                    .ok_or_else(|| DialogueError::WorkerFailed {
                        worker: "evaluation",
                        action: "run_validation",
                        message: validation_reply.error.unwrap_or_else(|| "validation failed".to_string()),
                    })?;

                let outcome: ValidationOutcome = serde_json::from_value(validation_data["outcome"].clone())
                    .map_err(|e| DialogueError::WorkerFailed { worker: "evaluation", action: "run_validation", message: e.to_string() })?;
                let report: ValidationReport = serde_json::from_value(validation_data["report"].clone())
                    .map_err(|e| DialogueError::WorkerFailed { worker: "evaluation", action: "run_validation", message: e.to_string() })?;
                let failure_explanation = validation_data.get("failure_explanation").and_then(|v| v.as_str()).map(|s| s.to_string());
                let issue_clusters: Vec<nwb_report::model::IssueCluster> =
                    validation_data.get("issue_clusters").cloned().and_then(|v| serde_json::from_value(v).ok()).unwrap_or_default();

                self.store.set_validation_outcome(outcome);
                self.store.set_validation_report(report.clone());

                let message = match outcome {
                    ValidationOutcome::Passed => {
                        let status = if session.correction_attempt > 0 { ValidationStatus::PassedImproved } else { ValidationStatus::Passed };
                        self.store.set_validation_status(status);
                        self.store.transition(SessionStatus::Completed)?;
                        nwb_llm::prompts::validation_summary_template("passed", report.issues.len())
                    }
                    ValidationOutcome::PassedWithIssues => {
                        self.store.transition(SessionStatus::AwaitingImprovementDecision)?;
                        let summary = nwb_llm::prompts::validation_summary_template("passed_with_issues", report.issues.len());
                        match cluster_explanations(&issue_clusters) {
                            Some(extra) => format!("{summary} {extra}"),
                            None => summary,
                        }
                    }
                    ValidationOutcome::Failed => {
                        if self.store.can_retry() {
                            self.store.transition(SessionStatus::AwaitingRetryApproval)?;
                        } else {
                            self.store.transition(SessionStatus::Failed)?;
                        }
                        let summary = failure_explanation.unwrap_or_else(|| nwb_llm::prompts::validation_summary_template("failed", report.issues.len()));
                        match cluster_explanations(&issue_clusters) {
                            Some(extra) => format!("{summary} {extra}"),
                            None => summary,
                        }
                    }
                };

                let status = self.store.snapshot().status;
                self.events.status_change(status);
                self.store.append_message(ConversationRole::Assistant, message.clone());
                self.events.assistant_message(&message);

                Ok(DialogueReply {
                    message,
                    status,
                    ready_to_proceed: true,
                    needs_more_info: false,
                    extracted_metadata: session.user_metadata.clone(),
                })
            }
            None => {
                let error_message = conversion_reply.error.unwrap_or_else(|| "conversion failed".to_string());
                self.store.append_log(LogSeverity::Error, format!("conversion failed: {error_message}"));
                self.store.transition(SessionStatus::Failed)?;
                self.events.status_change(SessionStatus::Failed);

                let message = nwb_llm::prompts::generate_failure_explanation(self.llm.as_ref(), &error_message).await;
                self.store.append_message(ConversationRole::Assistant, message.clone());
                self.events.assistant_message(&message);

                Ok(DialogueReply {
                    message,
                    status: SessionStatus::Failed,
                    ready_to_proceed: false,
                    needs_more_info: false,
                    extracted_metadata: session.user_metadata.clone(),
                })
            }
        }
    }
}

/// Joins each cluster's plain-language explanation (falling back to its root
/// cause and member count when the LLM didn't supply one) into a single
/// clause appended to the validation summary. `None` when there are no
/// clusters, which is the common case with the LLM disabled.
fn cluster_explanations(clusters: &[nwb_report::model::IssueCluster]) -> Option<String> {
    if clusters.is_empty() {
        return None;
    }
    Some(
        clusters
            .iter()
            .map(|c| {
                c.plain_language_explanation
                    .clone()
                    .unwrap_or_else(|| format!("{} affects {} check(s).", c.root_cause, c.member_checks.len()))
            })
            .collect::<Vec<_>>()
            .join(" "),
    )
}
