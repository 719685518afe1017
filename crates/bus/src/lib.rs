// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message bus: a named-worker registry that routes a request to exactly
//! one handler and awaits its reply, attaching a session snapshot to every
//! invocation.

mod error;
mod reply;

pub use error::BusError;
pub use reply::BusReply;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use nwb_core::Session;
use parking_lot::RwLock;
use serde_json::Value;

/// Context passed to a handler on every dispatch: a snapshot of the session
/// at dispatch time plus the caller-supplied payload.
#[derive(Debug, Clone)]
pub struct BusContext {
    pub session: Session,
    pub payload: Value,
}

/// A single (worker, action) handler. Implementations should not panic;
/// any fallible step should return `Err` so the bus can convert it into a
/// structured `{success: false, error}` reply instead of propagating.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: BusContext) -> Result<Value, String>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(BusContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Value, String>> + Send,
{
    async fn call(&self, ctx: BusContext) -> Result<Value, String> {
        (self)(ctx).await
    }
}

/// Named registry of workers. Each worker registers one or more named
/// actions; `send` routes a request to exactly one handler and awaits its
/// reply.
#[derive(Default)]
pub struct MessageBus {
    handlers: RwLock<HashMap<(String, String), Arc<dyn Handler>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `(worker_name, action_name)`. Registering the
    /// same pair twice replaces the previous handler — the bus guarantees
    /// exactly one handler per pair at dispatch time, not first-registration-wins.
    pub fn register(
        &self,
        worker_name: impl Into<String>,
        action_name: impl Into<String>,
        handler: impl Handler + 'static,
    ) {
        self.handlers.write().insert((worker_name.into(), action_name.into()), Arc::new(handler));
    }

    /// Dispatch a request to `(worker_name, action_name)`, awaiting the
    /// handler asynchronously. Any `Err` returned by the handler is captured
    /// as a structured `{success: false, error}` reply rather than
    /// propagated — handler failures never bubble up as
    /// bus-level errors. A bus-level `Err` (this method's `Result`) means
    /// there was no handler registered for that action at all.
    pub async fn send(
        &self,
        worker_name: &str,
        action_name: &str,
        session: Session,
        payload: Value,
    ) -> Result<BusReply, BusError> {
        let handler = {
            let handlers = self.handlers.read();
            handlers
                .get(&(worker_name.to_string(), action_name.to_string()))
                .cloned()
                .ok_or_else(|| BusError::NoSuchHandler {
                    worker: worker_name.to_string(),
                    action: action_name.to_string(),
                })?
        };

        let ctx = BusContext { session, payload };
        tracing::debug!(worker = worker_name, action = action_name, "dispatching bus message");
        match handler.call(ctx).await {
            Ok(data) => Ok(BusReply::ok(data)),
            Err(error) => {
                tracing::warn!(worker = worker_name, action = action_name, %error, "handler failed");
                Ok(BusReply::failed(error))
            }
        }
    }

    pub fn is_registered(&self, worker_name: &str, action_name: &str) -> bool {
        self.handlers.read().contains_key(&(worker_name.to_string(), action_name.to_string()))
    }
}
