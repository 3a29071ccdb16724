use std::{sync::Arc, time::Duration};

use serde_json::Value;

use crate::{
    backend::QueryBackend,
    config::GatewayConfig,
    core::{executor::Executor, query::ValidatedQuery, types::ResultSet},
    envelope::{self, OutboundEnvelope},
    error::{AppError, AppResult},
};

/// Request handler: extract, gate, execute, wrap.
///
/// Every failure, including a panic during handling, is reported as an
/// empty result set inside a well-formed envelope.
#[derive(Clone)]
pub struct Gateway {
    config: Arc<GatewayConfig>,
    executor: Executor,
}

impl Gateway {
    pub fn new(config: GatewayConfig, backend: Arc<dyn QueryBackend>) -> Self {
        let max_rows = config.max_rows;
        let config = Arc::new(config.with_max_rows(max_rows));
        Self {
            executor: Executor::new(backend, config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn handle(&self, envelope: Value) -> OutboundEnvelope {
        tracing::info!(event = %envelope, "envelope received");
        let envelope = Arc::new(envelope);

        let this = self.clone();
        let inbound = envelope.clone();
        let outcome = match tokio::spawn(async move { this.run(&inbound).await }).await {
            Ok(res) => res,
            Err(e) => Err(AppError::Internal(format!("request task failed: {e}"))),
        };

        match outcome {
            Ok(result) => envelope::wrap(&result, &envelope, 200),
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "request failed; returning empty result");
                envelope::wrap(&ResultSet::empty(), &envelope, e.http_status())
            }
        }
    }

    /// Like [`Gateway::handle`], for envelope text that may not be JSON.
    pub async fn handle_raw(&self, raw: &str) -> OutboundEnvelope {
        match serde_json::from_str::<Value>(raw) {
            Ok(envelope) => self.handle(envelope).await,
            Err(e) => {
                let err = AppError::MalformedInput(e.to_string());
                tracing::warn!(code = err.code(), error = %err, "unparseable envelope; returning empty result");
                envelope::wrap(&ResultSet::empty(), &Value::Null, err.http_status())
            }
        }
    }

    async fn run(&self, envelope: &Value) -> AppResult<ResultSet> {
        let req = envelope::extract(envelope, &self.config)?;

        let query = ValidatedQuery::new(&req.sql, self.config.max_rows).map_err(|rejection| {
            tracing::warn!(sql = %req.sql, %rejection, "query rejected");
            AppError::ValidationRejected(rejection.to_string())
        })?;
        tracing::info!(sql = %query.sql(), "running query");

        self.executor
            .execute(
                &query,
                &req.database,
                &req.workgroup,
                Duration::from_secs(req.max_wait_seconds),
            )
            .await
    }
}
