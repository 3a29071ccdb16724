//! Interface to the query-execution service.

pub mod sqlite;

use async_trait::async_trait;

use crate::{
    core::types::{ExecutionId, ExecutionStatus, RawResults, SubmitRequest},
    error::AppResult,
};

/// Narrow execute/poll/fetch surface of a managed query service.
///
/// Executions are owned by the service: the gateway submits, observes
/// status, may ask for cancellation, and reads results once succeeded.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn submit(&self, request: SubmitRequest) -> AppResult<ExecutionId>;

    async fn status(&self, id: &ExecutionId) -> AppResult<ExecutionStatus>;

    /// Best-effort. Stopping an execution that already finished is not an error.
    async fn cancel(&self, id: &ExecutionId) -> AppResult<()>;

    /// At most `max_results` raw rows, the header row included.
    async fn results(&self, id: &ExecutionId, max_results: usize) -> AppResult<RawResults>;
}
