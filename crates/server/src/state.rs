// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state: the session store, message bus, and dialogue
//! worker, assembled once at startup and cloned (cheaply, via `Arc`) into
//! every Axum handler, in dependency order: Session State Store ->
//! Message Bus -> (Conversion Worker, Evaluation Worker) -> Dialogue Worker.

use std::path::PathBuf;
use std::sync::Arc;

use nwb_adapters::{SubprocessConversionLibrary, SubprocessNwbValidator};
use nwb_bus::MessageBus;
use nwb_core::clock::SystemClock;
use nwb_core::SessionStore;
use nwb_workers::dialogue::events::EventSink;
use nwb_workers::{register_conversion_worker, register_evaluation_worker, ConversionWorker, DialogueWorker, EvaluationWorker};

use crate::config::Config;
use crate::events::BroadcastEventSink;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore<SystemClock>>,
    pub bus: Arc<MessageBus>,
    pub dialogue: Arc<DialogueWorker<SystemClock>>,
    pub events: Arc<BroadcastEventSink>,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AppState {
    /// Wire up the Session State Store, Message Bus, Conversion/Evaluation
    /// Workers, and the Dialogue Worker, in dependency order.
    pub fn new(config: &Config) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.upload_dir)?;
        std::fs::create_dir_all(&config.output_dir)?;

        let store = Arc::new(SessionStore::with_max_retry_attempts(SystemClock, config.max_retry_attempts));
        let bus = Arc::new(MessageBus::new());
        let events: Arc<BroadcastEventSink> = Arc::new(BroadcastEventSink::new(256));

        let llm = config.llm_client();

        let conversion_worker = Arc::new(ConversionWorker::new(
            Arc::new(SubprocessConversionLibrary::new(config.converter_cmd.clone())),
            llm.clone(),
            config.output_dir.clone(),
        ));
        register_conversion_worker(&bus, conversion_worker);

        let evaluation_worker = Arc::new(EvaluationWorker::new(
            Arc::new(SubprocessNwbValidator::new(config.validator_cmd.clone())),
            llm.clone(),
            config.output_dir.clone(),
        ));
        register_evaluation_worker(&bus, evaluation_worker);

        let extractor = Arc::new(nwb_llm::MetadataExtractor::new(llm.clone()));
        let event_sink: Arc<dyn EventSink> = events.clone();
        let dialogue = Arc::new(DialogueWorker::new(store.clone(), bus.clone(), extractor, llm, event_sink));

        Ok(Self { store, bus, dialogue, events, upload_dir: config.upload_dir.clone(), output_dir: config.output_dir.clone() })
    }

    /// Same wiring as [`Self::new`], but with the three external
    /// collaborators injected directly instead of built from
    /// `Config`, so integration tests can script conversion/validation/LLM
    /// behavior deterministically.
    #[cfg(any(test, feature = "test-support"))]
    #[allow(clippy::too_many_arguments)]
    pub fn assemble_for_test(
        max_retry_attempts: u32,
        upload_dir: PathBuf,
        output_dir: PathBuf,
        conversion_library: Arc<dyn nwb_adapters::ConversionLibrary>,
        validator: Arc<dyn nwb_adapters::NwbValidator>,
        conversion_llm: Arc<dyn nwb_adapters::LlmClient>,
        evaluation_llm: Arc<dyn nwb_adapters::LlmClient>,
        dialogue_llm: Arc<dyn nwb_adapters::LlmClient>,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(&upload_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        let store = Arc::new(SessionStore::with_max_retry_attempts(SystemClock, max_retry_attempts));
        let bus = Arc::new(MessageBus::new());
        let events: Arc<BroadcastEventSink> = Arc::new(BroadcastEventSink::new(256));

        let conversion_worker = Arc::new(ConversionWorker::new(conversion_library, conversion_llm, output_dir.clone()));
        register_conversion_worker(&bus, conversion_worker);

        let evaluation_worker = Arc::new(EvaluationWorker::new(validator, evaluation_llm, output_dir.clone()));
        register_evaluation_worker(&bus, evaluation_worker);

        let extractor = Arc::new(nwb_llm::MetadataExtractor::new(dialogue_llm.clone()));
        let event_sink: Arc<dyn EventSink> = events.clone();
        let dialogue = Arc::new(DialogueWorker::new(store.clone(), bus.clone(), extractor, dialogue_llm, event_sink));

        Ok(Self { store, bus, dialogue, events, upload_dir, output_dir })
    }
}
