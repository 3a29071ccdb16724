use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical request record extracted from an inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub sql: String,
    pub database: String,
    pub workgroup: String,
    pub max_wait_seconds: u64,
}

pub const DEFAULT_MAX_WAIT_SECONDS: u64 = 25;

/// Tabular payload returned to the orchestrator. Failures are reported as
/// `ResultSet::empty()`, never as a different shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub bytes_scanned: u64,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Backend-assigned identifier of a query execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExecutionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryState::Queued => "QUEUED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub sql: String,
    pub database: String,
    pub workgroup: String,
    pub output_location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    #[serde(default)]
    pub data_scanned_bytes: Option<u64>,
    #[serde(default)]
    pub engine_execution_time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub state: QueryState,
    #[serde(default)]
    pub state_change_reason: Option<String>,
    #[serde(default)]
    pub statistics: ExecutionStatistics,
}

/// Result page as the backend hands it out: the first row repeats the
/// column labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResults {
    pub column_labels: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}
