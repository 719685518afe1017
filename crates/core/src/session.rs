// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and state machine types.
//!
//! A [`Session`] is the single mutable record describing the lifecycle of one
//! neurophysiology-to-NWB conversion: which phase of the dialogue it is in,
//! what metadata has been collected, what the last conversion/validation
//! attempt produced, and the append-only transcript of the conversation.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationReport;

crate::define_id! {
    /// Unique identifier for a conversion session.
    pub struct SessionId("ses-");
}

/// Maximum number of correction attempts (re-conversions) after the initial
/// conversion. The initial conversion is attempt 0; retries are 1..=5.
pub const MAX_RETRY_ATTEMPTS: u32 = 5;

/// Coarse-grained operational state reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    UploadAcknowledged,
    AwaitingUserInput,
    DetectingFormat,
    Converting,
    Validating,
    AwaitingRetryApproval,
    AwaitingImprovementDecision,
    Completed,
    Failed,
}

crate::simple_display! {
    SessionStatus {
        Idle => "idle",
        UploadAcknowledged => "upload_acknowledged",
        AwaitingUserInput => "awaiting_user_input",
        DetectingFormat => "detecting_format",
        Converting => "converting",
        Validating => "validating",
        AwaitingRetryApproval => "awaiting_retry_approval",
        AwaitingImprovementDecision => "awaiting_improvement_decision",
        Completed => "completed",
        Failed => "failed",
    }
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Finer-grained dialogue phase, tracked alongside [`SessionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialoguePhase {
    Idle,
    MetadataCollection,
    Conversion,
    Validation,
    Decision,
    Done,
}

crate::simple_display! {
    DialoguePhase {
        Idle => "idle",
        MetadataCollection => "metadata_collection",
        Conversion => "conversion",
        Validation => "validation",
        Decision => "decision",
        Done => "done",
    }
}

/// Policy governing how many times the dialogue worker has asked for metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataPolicy {
    NotRequested,
    AskedOnce,
    UserDeclined,
    ProceedingMinimal,
}

crate::simple_display! {
    MetadataPolicy {
        NotRequested => "not_requested",
        AskedOnce => "asked_once",
        UserDeclined => "user_declined",
        ProceedingMinimal => "proceeding_minimal",
    }
}

pub use crate::validation::ValidationOutcome;

/// Terminal user decision recorded once a session reaches [`SessionStatus::Completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    PassedAccepted,
    PassedImproved,
    FailedUserDeclined,
}

crate::simple_display! {
    ValidationStatus {
        Passed => "passed",
        PassedAccepted => "passed_accepted",
        PassedImproved => "passed_improved",
        FailedUserDeclined => "failed_user_declined",
    }
}

/// Role attached to a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRole {
    User,
    Assistant,
    System,
}

crate::simple_display! {
    ConversationRole {
        User => "user",
        Assistant => "assistant",
        System => "system",
    }
}

/// A single entry in the append-only conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp_ms: u64,
}

/// Severity of a structured log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

crate::simple_display! {
    LogSeverity {
        Info => "info",
        Warning => "warning",
        Error => "error",
    }
}

/// A structured log entry, appended during dialogue/conversion/validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub message: String,
    pub timestamp_ms: u64,
}

/// A metadata field value, as accepted by the NWB metadata schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
    Number(f64),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A low/medium-confidence field, auto-applied but flagged for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataWarning {
    pub value: MetadataValue,
    pub confidence: u8,
    pub reason: String,
}

/// The mutable, singleton conversion session.
///
/// Owned exclusively by the session state store (see `nwb_core::store`); every
/// other component mutates it only through store-provided operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub status: SessionStatus,
    pub phase: DialoguePhase,
    pub input_path: Option<PathBuf>,
    pub detected_format: Option<String>,
    pub user_metadata: HashMap<String, MetadataValue>,
    pub metadata_policy: MetadataPolicy,
    pub metadata_warnings: HashMap<String, MetadataWarning>,
    pub validation_outcome: Option<ValidationOutcome>,
    pub validation_status: Option<ValidationStatus>,
    /// The full report produced by the Evaluation Worker's most recent
    /// `run_validation`, attached to the session for rendering.
    pub validation_report: Option<ValidationReport>,
    pub output_path: Option<PathBuf>,
    pub output_checksum: Option<String>,
    pub correction_attempt: u32,
    pub conversation_history: Vec<ConversationMessage>,
    pub logs: Vec<LogEntry>,
    pub active_processing: bool,
}

impl Session {
    /// Construct the empty, process-start session (`status = Idle`).
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            status: SessionStatus::Idle,
            phase: DialoguePhase::Idle,
            input_path: None,
            detected_format: None,
            user_metadata: HashMap::new(),
            metadata_policy: MetadataPolicy::NotRequested,
            metadata_warnings: HashMap::new(),
            validation_outcome: None,
            validation_status: None,
            validation_report: None,
            output_path: None,
            output_checksum: None,
            correction_attempt: 0,
            conversation_history: Vec::new(),
            logs: Vec::new(),
            active_processing: false,
        }
    }

    /// Derived truth: whether another correction attempt may be made.
    ///
    /// Never stored — always recomputed from `correction_attempt` (invariant #5).
    pub fn can_retry(&self) -> bool {
        self.correction_attempt < MAX_RETRY_ATTEMPTS
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Session {
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_phase(mut self, phase: DialoguePhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_correction_attempt(mut self, n: u32) -> Self {
        self.correction_attempt = n;
        self
    }
}
