// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket fan-out: a `tokio::sync::broadcast` channel owned by
//! [`crate::state::AppState`], published to by whichever worker/handler
//! performs the mutation, preserving enqueue order.

use serde::Serialize;
use tokio::sync::broadcast;

use nwb_core::{LogSeverity, SessionStatus};
use nwb_workers::dialogue::events::EventSink;

/// One of the four server -> client event kinds the streaming connection emits.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    StatusChange { status: SessionStatus },
    Progress { percentage: u8, step: String },
    AssistantMessage { text: String },
    Log { severity: LogSeverity, message: String },
}

/// Publishes every dialogue event onto a broadcast channel that `/ws`
/// subscribers drain. Lagging receivers drop old events rather than block
/// the publisher — acceptable for a progress/log stream where only the
/// latest state matters to a reconnecting client ("on
/// reconnection, the client is brought back into sync by requesting a full
/// snapshot").
pub struct BroadcastEventSink {
    sender: broadcast::Sender<StreamEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: StreamEvent) {
        // No active subscribers is the common case between connections;
        // not an error.
        let _ = self.sender.send(event);
    }
}

impl EventSink for BroadcastEventSink {
    fn status_change(&self, status: SessionStatus) {
        self.publish(StreamEvent::StatusChange { status });
    }

    fn progress(&self, percentage: u8, step: &str) {
        self.publish(StreamEvent::Progress { percentage, step: step.to_string() });
    }

    fn assistant_message(&self, text: &str) {
        self.publish(StreamEvent::AssistantMessage { text: text.to_string() });
    }

    fn log(&self, severity: LogSeverity, message: &str) {
        self.publish(StreamEvent::Log { severity, message: message.to_string() });
    }
}
