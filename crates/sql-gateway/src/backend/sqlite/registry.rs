use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use super::{query::Captured, worker::WorkerHandle};
use crate::{
    core::types::{ExecutionId, ExecutionStatistics, ExecutionStatus, QueryState},
    error::{AppError, AppResult},
};

/// Finished executions kept around for status and result reads.
pub const MAX_RETAINED_EXECUTIONS: usize = 512;

pub const CANCELLED_REASON: &str = "query was cancelled";

#[derive(Debug)]
pub struct Execution {
    pub state: QueryState,
    pub reason: Option<String>,
    pub workgroup: String,
    pub output_location: String,
    pub worker: WorkerHandle,
    started_at: Option<Instant>,
    elapsed_ms: Option<u64>,
    captured: Option<Captured>,
}

impl Execution {
    pub fn queued(worker: WorkerHandle, workgroup: String, output_location: String) -> Self {
        Self {
            state: QueryState::Queued,
            reason: None,
            workgroup,
            output_location,
            worker,
            started_at: None,
            elapsed_ms: None,
            captured: None,
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus {
            state: self.state,
            state_change_reason: self.reason.clone(),
            statistics: ExecutionStatistics {
                data_scanned_bytes: self.captured.as_ref().map(|c| c.bytes_read),
                engine_execution_time_ms: self.elapsed_ms,
            },
        }
    }

    pub fn captured(&self) -> Option<&Captured> {
        self.captured.as_ref()
    }

    pub fn start(&mut self) {
        self.state = QueryState::Running;
        self.started_at = Some(Instant::now());
    }

    /// Records the outcome unless the execution was cancelled meanwhile.
    pub fn finish(&mut self, outcome: AppResult<Captured>) {
        if self.state != QueryState::Running {
            return;
        }
        self.elapsed_ms = self
            .started_at
            .map(|t| u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX));
        match outcome {
            Ok(captured) => {
                self.state = QueryState::Succeeded;
                self.captured = Some(captured);
            }
            Err(e) => {
                self.state = QueryState::Failed;
                self.reason = Some(e.to_string());
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = QueryState::Cancelled;
        self.reason = Some(CANCELLED_REASON.to_string());
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    executions: HashMap<ExecutionId, Execution>,
    order: VecDeque<ExecutionId>,
}

impl Registry {
    pub fn insert(&mut self, id: ExecutionId, execution: Execution) {
        self.executions.insert(id.clone(), execution);
        self.order.push_back(id);
        self.evict_finished();
    }

    pub fn get(&self, id: &ExecutionId) -> AppResult<&Execution> {
        self.executions
            .get(id)
            .ok_or_else(|| AppError::Backend(format!("unknown execution: {id}")))
    }

    pub fn get_mut(&mut self, id: &ExecutionId) -> AppResult<&mut Execution> {
        self.executions
            .get_mut(id)
            .ok_or_else(|| AppError::Backend(format!("unknown execution: {id}")))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.executions.len()
    }

    fn evict_finished(&mut self) {
        if self.executions.len() <= MAX_RETAINED_EXECUTIONS {
            return;
        }
        let executions = &mut self.executions;
        let mut excess = executions.len() - MAX_RETAINED_EXECUTIONS;
        self.order.retain(|id| {
            if excess == 0 {
                return true;
            }
            let finished = executions
                .get(id)
                .map(|e| e.state.is_terminal())
                .unwrap_or(true);
            if finished {
                executions.remove(id);
                excess -= 1;
            }
            !finished
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedRegistry(Arc<Mutex<Registry>>);

impl SharedRegistry {
    pub fn lock(&self) -> AppResult<MutexGuard<'_, Registry>> {
        self.0
            .lock()
            .map_err(|_| AppError::Internal("poisoned lock".into()))
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::backend::sqlite::worker::WorkerPool;

    fn handle(dir: &tempfile::TempDir) -> WorkerHandle {
        let path = dir.path().join("fixture.db");
        Connection::open(&path)
            .and_then(|c| c.execute_batch("CREATE TABLE t (x INTEGER)"))
            .expect("create db");
        WorkerPool::new(SharedRegistry::default())
            .ensure_worker(&path)
            .expect("worker")
    }

    #[test]
    fn finish_is_ignored_after_cancel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut exec = Execution::queued(handle(&dir), "primary".into(), "file:///tmp/".into());
        exec.start();
        exec.cancel();
        exec.finish(Ok(Captured::default()));

        let status = exec.status();
        assert_eq!(status.state, QueryState::Cancelled);
        assert_eq!(status.state_change_reason.as_deref(), Some(CANCELLED_REASON));
        assert!(exec.captured().is_none());
    }

    #[test]
    fn failure_reason_is_recorded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut exec = Execution::queued(handle(&dir), "primary".into(), "file:///tmp/".into());
        exec.start();
        exec.finish(Err(AppError::Backend("no such table: nope".into())));

        let status = exec.status();
        assert_eq!(status.state, QueryState::Failed);
        assert_eq!(
            status.state_change_reason.as_deref(),
            Some("backend error: no such table: nope")
        );
        assert!(status.statistics.engine_execution_time_ms.is_some());
    }

    #[test]
    fn evicts_oldest_finished_executions_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = handle(&dir);
        let mut reg = Registry::default();

        // The first execution never finishes and must survive eviction.
        reg.insert(
            ExecutionId::from("pending"),
            Execution::queued(worker.clone(), "primary".into(), String::new()),
        );
        for i in 0..MAX_RETAINED_EXECUTIONS + 10 {
            let mut exec = Execution::queued(worker.clone(), "primary".into(), String::new());
            exec.start();
            exec.finish(Ok(Captured::default()));
            reg.insert(ExecutionId::from(format!("done-{i}")), exec);
        }

        assert_eq!(reg.len(), MAX_RETAINED_EXECUTIONS);
        assert!(reg.get(&ExecutionId::from("pending")).is_ok());
        assert!(reg.get(&ExecutionId::from("done-0")).is_err());
        assert!(reg
            .get(&ExecutionId::from(format!("done-{}", MAX_RETAINED_EXECUTIONS + 9)))
            .is_ok());
    }
}
