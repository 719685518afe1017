// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Bus-level failures — distinct from a handler reporting `{success: false}`,
/// which is not an error at this layer (see [`crate::MessageBus::send`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("no handler registered for {worker}.{action}")]
    NoSuchHandler { worker: String, action: String },
}
