// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured reply from a bus dispatch. A handler `Err` is captured here as
/// `success: false` rather than propagated as a Rust error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BusReply {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}
