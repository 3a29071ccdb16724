use std::{sync::Arc, time::Duration};

use tokio::time::Instant;

use crate::{
    backend::QueryBackend,
    config::GatewayConfig,
    core::{
        query::ValidatedQuery,
        types::{ExecutionId, ExecutionStatus, QueryState, RawResults, ResultSet, SubmitRequest},
    },
    error::{AppError, AppResult},
};

/// Drives one execution through submit, poll and fetch.
#[derive(Clone)]
pub struct Executor {
    backend: Arc<dyn QueryBackend>,
    config: Arc<GatewayConfig>,
}

impl Executor {
    pub fn new(backend: Arc<dyn QueryBackend>, config: Arc<GatewayConfig>) -> Self {
        Self { backend, config }
    }

    pub async fn execute(
        &self,
        query: &ValidatedQuery,
        database: &str,
        workgroup: &str,
        max_wait: Duration,
    ) -> AppResult<ResultSet> {
        let id = self
            .backend
            .submit(SubmitRequest {
                sql: query.sql().to_string(),
                database: database.to_string(),
                workgroup: workgroup.to_string(),
                output_location: self.config.output_location.clone(),
            })
            .await?;
        tracing::info!(execution_id = %id, database, workgroup, "query submitted");

        let status = self.wait_for_terminal(&id, max_wait).await?;
        if status.state != QueryState::Succeeded {
            return Err(AppError::ExecutionFailed {
                execution_id: id,
                state: status.state,
                reason: status.state_change_reason,
            });
        }

        let bytes_scanned = status.statistics.data_scanned_bytes.unwrap_or(0);
        let raw = self.backend.results(&id, self.config.fetch_cap()).await?;
        let result = flatten(raw, bytes_scanned);
        tracing::info!(
            execution_id = %id,
            columns = result.columns.len(),
            rows = result.rows.len(),
            bytes_scanned,
            "query succeeded"
        );
        Ok(result)
    }

    async fn wait_for_terminal(
        &self,
        id: &ExecutionId,
        max_wait: Duration,
    ) -> AppResult<ExecutionStatus> {
        let started = Instant::now();
        loop {
            let status = self.backend.status(id).await?;
            if status.state.is_terminal() {
                return Ok(status);
            }
            if started.elapsed() > max_wait {
                tracing::warn!(
                    execution_id = %id,
                    max_wait_secs = max_wait.as_secs(),
                    "execution timed out; cancelling"
                );
                if let Err(e) = self.backend.cancel(id).await {
                    tracing::warn!(execution_id = %id, error = %e, "cancel failed");
                }
                return Err(AppError::ExecutionTimeout {
                    execution_id: id.clone(),
                    waited_secs: max_wait.as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

/// Drops the header row and turns missing cells into empty strings.
pub fn flatten(raw: RawResults, bytes_scanned: u64) -> ResultSet {
    let rows = raw
        .rows
        .into_iter()
        .skip(1)
        .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
        .collect();
    ResultSet {
        columns: raw.column_labels,
        rows,
        bytes_scanned,
    }
}
