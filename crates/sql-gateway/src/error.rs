use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::{ExecutionId, QueryState};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("query rejected: {0}")]
    ValidationRejected(String),

    #[error("execution {execution_id} did not finish within {waited_secs}s")]
    ExecutionTimeout {
        execution_id: ExecutionId,
        waited_secs: u64,
    },

    #[error("execution {execution_id} ended in state {state}{}", reason_suffix(.reason))]
    ExecutionFailed {
        execution_id: ExecutionId,
        state: QueryState,
        reason: Option<String>,
    },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("failed to open database: {path}: {source}")]
    DbOpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Backend(e.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Io(std::io::Error::other(e))
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationRejected(_) => "VALIDATION_REJECTED",
            AppError::ExecutionTimeout { .. } => "EXECUTION_TIMEOUT",
            AppError::ExecutionFailed {
                state: QueryState::Cancelled,
                ..
            } => "EXECUTION_CANCELLED",
            AppError::ExecutionFailed { .. } => "EXECUTION_FAILED",
            AppError::Backend(_) => "BACKEND_ERROR",
            AppError::MalformedInput(_) => "MALFORMED_INPUT",
            AppError::DbOpenFailed { .. } => "DB_OPEN_FAILED",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    /// Status placed in the outbound envelope. Application failures are
    /// signalled through the empty result set, so only faults of the gateway
    /// itself get a non-200 status.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Internal(_) => 500,
            _ => 200,
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(": {r}"),
        None => String::new(),
    }
}

pub type AppResult<T> = Result<T, AppError>;
