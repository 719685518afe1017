// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registers the Conversion Worker and Evaluation Worker onto a
//! [`nwb_bus::MessageBus`] so the Dialogue Worker can reach them only
//! through `bus.send(worker, action, session, payload)`.
//! The Dialogue Worker's own client-triggered operations are not
//! bus-mediated — the bus exists specifically for worker-to-worker calls.

use std::sync::Arc;

use nwb_bus::{BusContext, MessageBus};
use nwb_core::MetadataValue;
use serde_json::json;
use std::collections::HashMap;

use crate::conversion::{self, ConversionWorker};
use crate::evaluation::{self, EvaluationWorker};

pub fn register_conversion_worker(bus: &MessageBus, worker: Arc<ConversionWorker>) {
    let w = worker.clone();
    bus.register(conversion::WORKER_NAME, conversion::ACTION_DETECT_FORMAT, move |ctx: BusContext| {
        let w = w.clone();
        async move {
            let input_path = ctx.session.input_path.clone().ok_or_else(|| "no input_path on session".to_string())?;
            let detected = w.detect_format(&input_path).await;
            Ok(json!({ "format": detected.format, "confidence": detected.confidence }))
        }
    });

    let w = worker.clone();
    bus.register(conversion::WORKER_NAME, conversion::ACTION_RUN_CONVERSION, move |ctx: BusContext| {
        let w = w.clone();
        async move {
            let input_path = ctx.session.input_path.clone().ok_or_else(|| "no input_path on session".to_string())?;
            let format = ctx.session.detected_format.clone().unwrap_or_else(|| "Unknown".to_string());
            w.run_conversion(&input_path, &format, &ctx.session.user_metadata, ctx.session.correction_attempt)
                .await
                .map(|o| json!({ "output_path": o.output_path.display().to_string(), "checksum": o.checksum }))
                .map_err(|e| e.to_string())
        }
    });

    let w = worker;
    bus.register(conversion::WORKER_NAME, conversion::ACTION_APPLY_CORRECTIONS, move |ctx: BusContext| {
        let w = w.clone();
        async move {
            let input_path = ctx.session.input_path.clone().ok_or_else(|| "no input_path on session".to_string())?;
            let format = ctx.session.detected_format.clone().unwrap_or_else(|| "Unknown".to_string());
            let corrections: HashMap<String, MetadataValue> = ctx
                .payload
                .get("corrections")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            w.apply_corrections(&input_path, &format, &ctx.session.user_metadata, &corrections, ctx.session.correction_attempt)
                .await
                .map(|o| json!({ "output_path": o.output_path.display().to_string(), "checksum": o.checksum }))
                .map_err(|e| e.to_string())
        }
    });
}

pub fn register_evaluation_worker(bus: &MessageBus, worker: Arc<EvaluationWorker>) {
    bus.register(evaluation::WORKER_NAME, evaluation::ACTION_RUN_VALIDATION, move |ctx: BusContext| {
        let w = worker.clone();
        async move {
            let output_path = ctx.session.output_path.clone().ok_or_else(|| "no output_path on session".to_string())?;
            let trace: nwb_core::WorkflowTrace = ctx
                .payload
                .get("trace")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .ok_or_else(|| "missing workflow trace in payload".to_string())?;

            let outcome = w.run_validation(&output_path, trace, std::time::Instant::now()).await.map_err(|e| e.to_string())?;

            let report_ctx = nwb_report::ReportContext {
                session_id: ctx.session.id.to_string(),
                nwb_path: output_path,
                nwb_checksum: ctx.session.output_checksum.clone().unwrap_or_default(),
                validation_status: ctx.session.validation_status.map(|s| s.to_string()),
                report: outcome.report.clone(),
                user_metadata: ctx.session.user_metadata.clone(),
                metadata_warnings: ctx.session.metadata_warnings.clone(),
                generated_at_ms: chrono::Utc::now().timestamp_millis() as u64,
            };
            if let Err(e) = w.persist_reports(&report_ctx) {
                tracing::warn!(error = %e, session_id = %ctx.session.id, "failed to persist report artifacts to disk");
            }

            Ok(json!({
                "outcome": outcome.outcome,
                "dandi_readiness_score": outcome.dandi_readiness_score,
                "failure_explanation": outcome.failure_explanation,
                "issue_clusters": outcome.issue_clusters,
                "report": outcome.report,
            }))
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use nwb_adapters::{FakeConversionLibrary, FakeNwbValidator, NullLlmClient};
    use nwb_core::Session;
    use serde_json::json;

    #[tokio::test]
    async fn conversion_actions_are_reachable_over_the_bus() {
        let bus = MessageBus::new();
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(ConversionWorker::new(
            Arc::new(FakeConversionLibrary::new()),
            Arc::new(NullLlmClient),
            dir.path().to_path_buf(),
        ));
        register_conversion_worker(&bus, worker);

        let mut session = Session::new();
        session.input_path = Some(dir.path().join("in.bin"));
        session.detected_format = Some("SpikeGLX".to_string());

        let reply = bus.send("conversion", "run_conversion", session, json!({})).await.unwrap();
        assert!(reply.success);
        assert!(reply.data.unwrap()["checksum"].as_str().unwrap().len() == 64);
    }

    #[tokio::test]
    async fn evaluation_action_is_reachable_over_the_bus() {
        let bus = MessageBus::new();
        let dir = tempfile::tempdir().unwrap();
        let worker = Arc::new(EvaluationWorker::new(Arc::new(FakeNwbValidator::new(vec![])), Arc::new(NullLlmClient), dir.path().to_path_buf()));
        register_evaluation_worker(&bus, worker);

        let output_path = dir.path().join("out.nwb");
        std::fs::write(&output_path, b"x").unwrap();

        let mut session = Session::new();
        session.output_path = Some(output_path);
        let trace = nwb_core::WorkflowTrace {
            input_path: "in.bin".into(),
            input_checksum: None,
            detected_format: Some("SpikeGLX".into()),
            steps: vec![],
            technologies: HashMap::new(),
            parameters: HashMap::new(),
            output_path: "out.nwb".into(),
            output_checksum: "abc".into(),
            started_at_ms: 0,
            duration_seconds: 0.0,
        };

        let reply = bus.send("evaluation", "run_validation", session, json!({"trace": trace})).await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.data.unwrap()["outcome"], json!("passed"));
    }
}
