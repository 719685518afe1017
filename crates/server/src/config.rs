// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recognized environment inputs. Every value has a documented default so
//! the server starts cleanly in a bare environment.

use std::path::PathBuf;

/// Server configuration, read once at startup from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Presence selects [`nwb_adapters::HttpLlmClient`]; absence selects
    /// [`nwb_adapters::NullLlmClient`] and the system runs in degraded mode.
    pub anthropic_api_key: Option<String>,
    pub log_level: String,
    pub max_retry_attempts: u32,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub converter_cmd: String,
    pub validator_cmd: String,
    pub bind_addr: String,
}

impl Config {
    /// Read configuration from the environment, applying the documented
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            max_retry_attempts: std::env::var("MAX_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(nwb_core::MAX_RETRY_ATTEMPTS),
            upload_dir: std::env::var("NWB_UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./data/uploads")),
            output_dir: std::env::var("NWB_OUTPUT_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./data/output")),
            converter_cmd: std::env::var("NWB_CONVERTER_CMD").unwrap_or_else(|_| "neuroconv-run".to_string()),
            validator_cmd: std::env::var("NWB_VALIDATOR_CMD").unwrap_or_else(|_| "nwbinspector-run".to_string()),
            bind_addr: std::env::var("NWB_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string()),
        }
    }

    pub fn llm_client(&self) -> std::sync::Arc<dyn nwb_adapters::LlmClient> {
        match &self.anthropic_api_key {
            Some(key) => std::sync::Arc::new(nwb_adapters::HttpLlmClient::new(key.clone())),
            None => std::sync::Arc::new(nwb_adapters::NullLlmClient),
        }
    }
}
