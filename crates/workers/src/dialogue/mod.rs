// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dialogue Worker: the phase machine that
//! drives the user-visible workflow end to end — metadata collection,
//! conversion, validation, and the user-gated decision points.

pub mod events;
pub mod handlers;
pub mod metadata;
pub mod policy;

use std::collections::HashMap;
use std::sync::Arc;

use nwb_adapters::LlmClient;
use nwb_bus::MessageBus;
use nwb_core::clock::Clock;
use nwb_core::{MetadataValue, SessionStatus, SessionStore};
use thiserror::Error;

use events::EventSink;

pub const WORKER_NAME: &str = "dialogue";
pub const ACTION_HANDLE_UPLOAD: &str = "handle_upload";
pub const ACTION_HANDLE_START_CONVERSION: &str = "handle_start_conversion";
pub const ACTION_HANDLE_USER_MESSAGE: &str = "handle_user_message";
pub const ACTION_HANDLE_RETRY_DECISION: &str = "handle_retry_decision";
pub const ACTION_HANDLE_IMPROVEMENT_DECISION: &str = "handle_improvement_decision";

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error(transparent)]
    Store(#[from] nwb_core::StoreError),
    #[error(transparent)]
    Bus(#[from] nwb_bus::BusError),
    #[error("{worker}.{action} failed: {message}")]
    WorkerFailed { worker: &'static str, action: &'static str, message: String },
    #[error("invalid decision: {0}")]
    InvalidDecision(String),
}

/// Response shape for `handle_start_conversion`/`handle_user_message`,
/// mirrored directly into the `POST /api/chat` response body.
#[derive(Debug, Clone)]
pub struct DialogueReply {
    pub message: String,
    pub status: SessionStatus,
    pub ready_to_proceed: bool,
    pub needs_more_info: bool,
    pub extracted_metadata: HashMap<String, MetadataValue>,
}

/// `handle_user_message` either proceeds normally or reports `busy` without
/// consuming the message.
#[derive(Debug, Clone)]
pub enum HandleMessageOutcome {
    Busy,
    Reply(DialogueReply),
}

/// RAII guard releasing the `active_processing` slot on every exit path,
/// including an early return via `?`.
struct ProcessingGuard<'a, C: Clock> {
    store: &'a SessionStore<C>,
}

impl<'a, C: Clock> Drop for ProcessingGuard<'a, C> {
    fn drop(&mut self) {
        self.store.release_llm_slot();
    }
}

/// Drives the phase machine and reaches the Conversion Worker and
/// Evaluation Worker only through the [`MessageBus`] ("the
/// Dialogue Worker can have one conversion and one evaluation call in
/// flight concurrently only if the phase machine permits it"). The phase
/// machine here is strictly sequential, so in practice at most one such
/// call is ever outstanding — see [`ProcessingGuard`].
pub struct DialogueWorker<C: Clock> {
    pub(crate) store: Arc<SessionStore<C>>,
    pub(crate) bus: Arc<MessageBus>,
    pub(crate) extractor: Arc<nwb_llm::MetadataExtractor>,
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl<C: Clock> DialogueWorker<C> {
    pub fn new(
        store: Arc<SessionStore<C>>,
        bus: Arc<MessageBus>,
        extractor: Arc<nwb_llm::MetadataExtractor>,
        llm: Arc<dyn LlmClient>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self { store, bus, extractor, llm, events }
    }
}
