// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::execute::{ExecuteError, FlowExecutionRequest, FlowExecutor};
use crate::notify::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotify<N> {
    inner: N,
}

impl<N> TracedNotify<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotify<N> {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        async {
            tracing::info!(recipients = recipients.len(), body_len = body.len(), "sending");
            let start = std::time::Instant::now();
            let result = self.inner.send(recipients, subject, body).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "notification sent"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "send failed"),
            }
            result
        }
        .instrument(tracing::info_span!("notify.send", subject))
        .await
    }
}

/// Wrapper that adds tracing to any FlowExecutor
#[derive(Clone)]
pub struct TracedExecutor<E> {
    inner: E,
}

impl<E> TracedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: FlowExecutor> FlowExecutor for TracedExecutor<E> {
    async fn execute_flow(&self, request: &FlowExecutionRequest) -> Result<(), ExecuteError> {
        let span = tracing::info_span!(
            "executor.execute_flow",
            project_id = request.project_id,
            flow = %request.flow_id,
        );
        async {
            tracing::info!(user = %request.submit_user, "starting");
            let start = std::time::Instant::now();
            let result = self.inner.execute_flow(request).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "flow submitted"),
                Err(ExecuteError::Skipped(reason)) => {
                    tracing::info!(elapsed_ms, %reason, "flow skipped")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "execute failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
