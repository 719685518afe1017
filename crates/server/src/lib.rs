// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/JSON API and `/ws` streaming connection for the NWB conversion
//! orchestrator. This crate is the outermost layer: it wires
//! [`nwb_core`], [`nwb_bus`], [`nwb_workers`], [`nwb_llm`], and
//! [`nwb_report`] into an `axum` app and exposes nothing else.

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;
