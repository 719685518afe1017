// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming event sink for the `/ws` connection. Kept as a
//! trait rather than a concrete channel type so `nwb-workers` never depends
//! on `nwb-server`'s Axum/broadcast stack — `nwb-server` supplies the real
//! implementation.

use nwb_core::{LogSeverity, SessionStatus};

/// One of the four event kinds the persistent streaming connection emits:
/// `status_change`, `progress`, `assistant_message`,
/// `log`.
pub trait EventSink: Send + Sync {
    fn status_change(&self, status: SessionStatus);
    fn progress(&self, percentage: u8, step: &str);
    fn assistant_message(&self, text: &str);
    fn log(&self, severity: LogSeverity, message: &str);
}

/// No-op sink for callers that don't need streaming (tests, the CLI-only
/// path).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn status_change(&self, _status: SessionStatus) {}
    fn progress(&self, _percentage: u8, _step: &str) {}
    fn assistant_message(&self, _text: &str) {}
    fn log(&self, _severity: LogSeverity, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_every_event_without_panicking() {
        let sink = NullEventSink;
        sink.status_change(SessionStatus::Idle);
        sink.progress(50, "halfway");
        sink.assistant_message("hello");
        sink.log(LogSeverity::Info, "noted");
    }
}
