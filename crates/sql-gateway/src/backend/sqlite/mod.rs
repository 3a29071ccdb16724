//! Local stand-in for a managed query service, backed by SQLite files.
//!
//! `database` selects `<data_dir>/<database>.db`. Submissions return at once
//! and run on the database's worker thread, so callers observe the same
//! QUEUED → RUNNING → terminal lifecycle a remote service exposes.

mod query;
mod readonly;
mod registry;
mod worker;

use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;

use self::{
    registry::{Execution, SharedRegistry},
    worker::{is_safe_identifier, WorkerPool},
};
use super::QueryBackend;
use crate::{
    core::types::{ExecutionId, ExecutionStatus, QueryState, RawResults, SubmitRequest},
    error::{AppError, AppResult},
};

pub use registry::{CANCELLED_REASON, MAX_RETAINED_EXECUTIONS};

#[derive(Debug)]
pub struct SqliteBackend {
    data_dir: PathBuf,
    registry: SharedRegistry,
    workers: WorkerPool,
    next_id: AtomicU64,
}

impl SqliteBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let registry = SharedRegistry::default();
        Self {
            data_dir: data_dir.into(),
            workers: WorkerPool::new(registry.clone()),
            registry,
            next_id: AtomicU64::new(1),
        }
    }

    fn database_path(&self, database: &str) -> AppResult<PathBuf> {
        if !is_safe_identifier(database) {
            return Err(AppError::Backend(format!(
                "invalid database name: {database}"
            )));
        }
        Ok(self.data_dir.join(format!("{database}.db")))
    }

    fn new_execution_id(&self) -> ExecutionId {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        ExecutionId::from(format!("q-{}-{seq:06}", std::process::id()))
    }
}

#[async_trait]
impl QueryBackend for SqliteBackend {
    async fn submit(&self, request: SubmitRequest) -> AppResult<ExecutionId> {
        let db_path = self.database_path(&request.database)?;
        let worker = self.workers.ensure_worker(&db_path)?;
        let id = self.new_execution_id();

        self.registry.lock()?.insert(
            id.clone(),
            Execution::queued(worker.clone(), request.workgroup, request.output_location),
        );
        if let Err(e) = worker.enqueue(id.clone(), request.sql) {
            if let Ok(mut reg) = self.registry.lock() {
                if let Ok(exec) = reg.get_mut(&id) {
                    exec.state = QueryState::Failed;
                    exec.reason = Some(e.to_string());
                }
            }
            return Err(e);
        }

        tracing::debug!(execution_id = %id, path = %db_path.display(), "execution queued");
        Ok(id)
    }

    async fn status(&self, id: &ExecutionId) -> AppResult<ExecutionStatus> {
        Ok(self.registry.lock()?.get(id)?.status())
    }

    async fn cancel(&self, id: &ExecutionId) -> AppResult<()> {
        let mut reg = self.registry.lock()?;
        let exec = reg.get_mut(id)?;
        match exec.state {
            QueryState::Queued => exec.cancel(),
            QueryState::Running => {
                exec.cancel();
                // The worker clears the abort flag only while holding the
                // registry lock, so it cannot be reset before this lands.
                exec.worker.interrupt();
            }
            _ => {}
        }
        tracing::debug!(
            execution_id = %id,
            workgroup = %exec.workgroup,
            state = %exec.state,
            "cancel requested"
        );
        Ok(())
    }

    async fn results(&self, id: &ExecutionId, max_results: usize) -> AppResult<RawResults> {
        let reg = self.registry.lock()?;
        let exec = reg.get(id)?;
        let captured = match (exec.state, exec.captured()) {
            (QueryState::Succeeded, Some(c)) => c,
            (state, _) => {
                return Err(AppError::Backend(format!(
                    "execution {id} is {state}, results unavailable"
                )))
            }
        };

        let header = captured.columns.iter().cloned().map(Some).collect();
        let mut rows = Vec::with_capacity(max_results.min(captured.rows.len() + 1));
        rows.push(header);
        rows.extend(
            captured
                .rows
                .iter()
                .take(max_results.saturating_sub(1))
                .cloned(),
        );
        tracing::debug!(
            execution_id = %id,
            output_location = %exec.output_location,
            rows = rows.len(),
            "results read"
        );

        Ok(RawResults {
            column_labels: captured.columns.clone(),
            rows,
        })
    }
}
