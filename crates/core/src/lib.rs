// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core domain types for the NWB conversion orchestrator: the session state
//! machine, its mutex-guarded store, and the shared ID/clock utilities the
//! rest of the workspace builds on.

#[macro_use]
pub mod macros;

pub mod clock;
pub mod id;
pub mod parsed_field;
pub mod schema;
pub mod session;
pub mod store;
pub mod validation;

pub use clock::{Clock, FakeClock, SystemClock};
pub use parsed_field::{ConfidenceTier, ParsedField};
pub use schema::{FieldSchema, NormalizationRule, FIELD_SCHEMA};
pub use session::{
    ConversationMessage, ConversationRole, DialoguePhase, LogEntry, LogSeverity, MetadataPolicy,
    MetadataValue, MetadataWarning, Session, SessionId, SessionStatus, ValidationStatus,
    MAX_RETRY_ATTEMPTS,
};
pub use store::{SessionStore, StoreError};
pub use validation::{
    classify_outcome, dandi_readiness_score, Severity, ValidationIssue, ValidationOutcome,
    ValidationReport, WorkflowStep, WorkflowTrace,
};
