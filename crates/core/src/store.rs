// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session state store.
//!
//! The only permitted access point to the singleton [`Session`]. Every
//! mutation acquires the session mutex so that client HTTP requests, worker
//! callbacks, and LLM callbacks serialize against each other (see
//! `SYSTEM.md` §5 "Concurrency & resource model").

use std::path::PathBuf;

use parking_lot::Mutex;
use thiserror::Error;

use crate::clock::Clock;
use crate::session::{
    ConversationMessage, ConversationRole, DialoguePhase, LogEntry, LogSeverity, MetadataPolicy,
    MetadataValue, MetadataWarning, Session, SessionStatus, ValidationOutcome, ValidationStatus,
    MAX_RETRY_ATTEMPTS,
};
use crate::validation::ValidationReport;

/// Failures surfaced by store operations. None of these corrupt state: the
/// mutation simply does not happen and the session is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Attempted transition is not in the allowed-transitions table.
    #[error("transition refused: {from} -> {to}")]
    TransitionRefused { from: SessionStatus, to: SessionStatus },

    /// `correction_attempt` would exceed [`MAX_RETRY_ATTEMPTS`].
    #[error("retry limit exceeded: correction_attempt already at {current}")]
    RetryLimitExceeded { current: u32 },

    /// A second LLM/worker call was requested while one was already in flight.
    #[error("busy: a call is already in flight")]
    Busy,

    /// Reset requested while a call was in flight.
    #[error("cannot reset while active_processing is set")]
    ResetWhileActive,
}

/// Returns true iff `to` is a permitted successor of `from` in the phase
/// machine described in the dialogue worker's design (the diagram in
/// `SYSTEM.md` §4.3). Self-loops on `AwaitingUserInput` (another round of
/// metadata collection) are permitted; every other pair must be listed here.
fn is_allowed_transition(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::*;
    matches!(
        (from, to),
        (Idle, UploadAcknowledged)
            | (UploadAcknowledged, AwaitingUserInput)
            | (AwaitingUserInput, AwaitingUserInput)
            | (AwaitingUserInput, DetectingFormat)
            | (DetectingFormat, Converting)
            | (DetectingFormat, Failed)
            | (Converting, Validating)
            | (Converting, Failed)
            | (Validating, Completed)
            | (Validating, AwaitingImprovementDecision)
            | (Validating, AwaitingRetryApproval)
            | (Validating, Failed)
            | (AwaitingRetryApproval, Converting)
            | (AwaitingRetryApproval, Failed)
            | (AwaitingRetryApproval, Completed)
            | (AwaitingImprovementDecision, Completed)
            | (AwaitingImprovementDecision, Converting)
    )
}

/// Guards the singleton [`Session`] behind a mutex and exposes the only
/// operations permitted to mutate it.
pub struct SessionStore<C: Clock> {
    inner: Mutex<Session>,
    clock: C,
    max_retry_attempts: u32,
}

impl<C: Clock> SessionStore<C> {
    pub fn new(clock: C) -> Self {
        Self::with_max_retry_attempts(clock, MAX_RETRY_ATTEMPTS)
    }

    /// Construct a store with an operator-configured retry ceiling
    /// (`MAX_RETRY_ATTEMPTS` env var). Still enforces the retry-ceiling
    /// invariant; it just
    /// lets the ceiling differ from the compiled-in default.
    pub fn with_max_retry_attempts(clock: C, max_retry_attempts: u32) -> Self {
        Self { inner: Mutex::new(Session::new()), clock, max_retry_attempts }
    }

    pub fn max_retry_attempts(&self) -> u32 {
        self.max_retry_attempts
    }

    /// Current wall-clock time in epoch milliseconds, per the store's clock.
    /// Used by workers to stamp `WorkflowTrace.started_at_ms` consistently
    /// with `conversation_history`/`logs` timestamps.
    pub fn epoch_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Derived truth against the store's configured ceiling, not the
    /// compiled-in constant (see [`Session::can_retry`] for the latter).
    pub fn can_retry(&self) -> bool {
        self.inner.lock().correction_attempt < self.max_retry_attempts
    }

    /// Deep-copied, read-only view of the session. Safe to iterate without
    /// holding the mutex (invariant #3: history reads are defensive copies).
    pub fn snapshot(&self) -> Session {
        self.inner.lock().clone()
    }

    /// Atomic append to `conversation_history`.
    pub fn append_message(&self, role: ConversationRole, content: impl Into<String>) {
        let mut session = self.inner.lock();
        let timestamp_ms = self.clock.epoch_ms();
        session.conversation_history.push(ConversationMessage {
            role,
            content: content.into(),
            timestamp_ms,
        });
    }

    /// Atomic append to `logs`.
    pub fn append_log(&self, severity: LogSeverity, message: impl Into<String>) {
        let mut session = self.inner.lock();
        let timestamp_ms = self.clock.epoch_ms();
        session.logs.push(LogEntry { severity, message: message.into(), timestamp_ms });
    }

    /// Validate and apply a status transition, updating `phase` to match.
    ///
    /// Illegal transitions are programming errors: they are logged at ERROR
    /// and leave the session state completely unchanged (§4.1 failure
    /// semantics).
    pub fn transition(&self, new_status: SessionStatus) -> Result<(), StoreError> {
        let mut session = self.inner.lock();
        if !is_allowed_transition(session.status, new_status) {
            let err = StoreError::TransitionRefused { from: session.status, to: new_status };
            let timestamp_ms = self.clock.epoch_ms();
            session.logs.push(LogEntry {
                severity: LogSeverity::Error,
                message: err.to_string(),
                timestamp_ms,
            });
            return Err(err);
        }
        session.status = new_status;
        session.phase = phase_for_status(new_status, session.phase);
        Ok(())
    }

    pub fn set_input(&self, path: PathBuf) {
        self.inner.lock().input_path = Some(path);
    }

    pub fn set_detected_format(&self, format: impl Into<String>) {
        self.inner.lock().detected_format = Some(format.into());
    }

    pub fn set_output(&self, path: PathBuf, checksum: impl Into<String>) {
        let mut session = self.inner.lock();
        session.output_path = Some(path);
        session.output_checksum = Some(checksum.into());
    }

    pub fn set_metadata_policy(&self, policy: MetadataPolicy) {
        self.inner.lock().metadata_policy = policy;
    }

    pub fn set_metadata_field(&self, field: impl Into<String>, value: MetadataValue) {
        self.inner.lock().user_metadata.insert(field.into(), value);
    }

    pub fn add_metadata_warning(&self, field: impl Into<String>, warning: MetadataWarning) {
        self.inner.lock().metadata_warnings.insert(field.into(), warning);
    }

    /// Clears every pending low-confidence field once the user confirms them
    /// (an empty or affirmative reply during metadata collection). The
    /// values were already written to `user_metadata` when first proposed;
    /// this only resolves the "needs review" flag. Returns the field names
    /// that were pending, for logging.
    pub fn confirm_metadata_warnings(&self) -> Vec<String> {
        let mut session = self.inner.lock();
        let fields: Vec<String> = session.metadata_warnings.keys().cloned().collect();
        session.metadata_warnings.clear();
        fields
    }

    /// Atomic write of `validation_outcome` (§4.1 `set_validation_result`).
    /// `correction_attempt` bookkeeping happens separately via
    /// [`Self::increment_correction_attempt`] so retry approval stays explicit.
    pub fn set_validation_outcome(&self, outcome: ValidationOutcome) {
        self.inner.lock().validation_outcome = Some(outcome);
    }

    pub fn set_validation_status(&self, status: ValidationStatus) {
        self.inner.lock().validation_status = Some(status);
    }

    /// Attach the Evaluation Worker's full report for report rendering.
    pub fn set_validation_report(&self, report: ValidationReport) {
        self.inner.lock().validation_report = Some(report);
    }

    /// Increment `correction_attempt`, refusing if doing so would exceed
    /// [`MAX_RETRY_ATTEMPTS`] (invariant #1). Callers check `can_retry()`
    /// before offering a retry, so this should only fail on a racing caller.
    pub fn increment_correction_attempt(&self) -> Result<u32, StoreError> {
        let mut session = self.inner.lock();
        if session.correction_attempt >= self.max_retry_attempts {
            return Err(StoreError::RetryLimitExceeded { current: session.correction_attempt });
        }
        session.correction_attempt += 1;
        Ok(session.correction_attempt)
    }

    /// Set `active_processing`; fails if a call is already in flight
    /// (invariant #6).
    pub fn acquire_llm_slot(&self) -> Result<(), StoreError> {
        let mut session = self.inner.lock();
        if session.active_processing {
            return Err(StoreError::Busy);
        }
        session.active_processing = true;
        Ok(())
    }

    pub fn release_llm_slot(&self) {
        self.inner.lock().active_processing = false;
    }

    pub fn is_active_processing(&self) -> bool {
        self.inner.lock().active_processing
    }

    /// Restore every field to its initial value (invariant #4). Refused while
    /// a call is in flight so a reset can never race a worker holding a
    /// snapshot (§5 "Reset as a concurrency event").
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut session = self.inner.lock();
        if session.active_processing {
            return Err(StoreError::ResetWhileActive);
        }
        *session = Session::new();
        Ok(())
    }
}

/// Derive the coarse dialogue phase that accompanies a status, preserving
/// the previous phase for statuses that don't imply a specific one (e.g.
/// `Failed` can be reached from any phase).
fn phase_for_status(status: SessionStatus, previous: DialoguePhase) -> DialoguePhase {
    use SessionStatus::*;
    match status {
        Idle => DialoguePhase::Idle,
        UploadAcknowledged | AwaitingUserInput => DialoguePhase::MetadataCollection,
        DetectingFormat | Converting => DialoguePhase::Conversion,
        Validating => DialoguePhase::Validation,
        AwaitingRetryApproval | AwaitingImprovementDecision => DialoguePhase::Decision,
        Completed | Failed => DialoguePhase::Done,
        #[allow(unreachable_patterns)]
        _ => previous,
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
