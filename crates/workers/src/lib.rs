// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three workers the Message Bus coordinates: the
//! Conversion Worker and Evaluation Worker, reachable only via
//! [`nwb_bus::MessageBus`], and the Dialogue Worker that drives them.

pub mod conversion;
pub mod dialogue;
pub mod evaluation;
pub mod metadata_shape;
pub mod wiring;

pub use conversion::ConversionWorker;
pub use dialogue::{DialogueError, DialogueReply, DialogueWorker, HandleMessageOutcome};
pub use evaluation::EvaluationWorker;
pub use wiring::{register_conversion_worker, register_evaluation_worker};
