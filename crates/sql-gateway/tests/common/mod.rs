#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use sql_gateway::{
    backend::QueryBackend,
    core::types::{
        ExecutionId, ExecutionStatistics, ExecutionStatus, QueryState, RawResults, SubmitRequest,
    },
    AppError, AppResult, Gateway, GatewayConfig,
};

/// In-memory backend that replays a fixed sequence of states.
#[derive(Default)]
pub struct ScriptedBackend {
    pub states: Mutex<VecDeque<QueryState>>,
    pub reason: Option<String>,
    pub statistics: ExecutionStatistics,
    pub raw: RawResults,
    pub fail_submit: bool,
    pub fail_cancel: bool,
    pub panic_on_status: bool,
    pub calls: Mutex<Calls>,
}

#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub submitted: Vec<SubmitRequest>,
    pub status_polls: usize,
    pub cancels: Vec<ExecutionId>,
    pub results_max: Vec<usize>,
}

impl ScriptedBackend {
    pub fn with_states(states: &[QueryState]) -> Self {
        Self {
            states: Mutex::new(states.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl QueryBackend for ScriptedBackend {
    async fn submit(&self, request: SubmitRequest) -> AppResult<ExecutionId> {
        if self.fail_submit {
            return Err(AppError::Backend("workgroup is disabled".into()));
        }
        self.calls.lock().expect("calls lock").submitted.push(request);
        Ok(ExecutionId::from("exec-1"))
    }

    async fn status(&self, _id: &ExecutionId) -> AppResult<ExecutionStatus> {
        if self.panic_on_status {
            panic!("status endpoint exploded");
        }
        self.calls.lock().expect("calls lock").status_polls += 1;
        let mut states = self.states.lock().expect("states lock");
        // The last scripted state repeats forever.
        let state = if states.len() > 1 {
            states.pop_front().unwrap_or(QueryState::Running)
        } else {
            states.front().copied().unwrap_or(QueryState::Running)
        };
        Ok(ExecutionStatus {
            state,
            state_change_reason: self.reason.clone(),
            statistics: self.statistics.clone(),
        })
    }

    async fn cancel(&self, id: &ExecutionId) -> AppResult<()> {
        self.calls.lock().expect("calls lock").cancels.push(id.clone());
        if self.fail_cancel {
            return Err(AppError::Backend("cancel refused".into()));
        }
        Ok(())
    }

    async fn results(&self, _id: &ExecutionId, max_results: usize) -> AppResult<RawResults> {
        self.calls.lock().expect("calls lock").results_max.push(max_results);
        Ok(self.raw.clone())
    }
}

pub fn config() -> GatewayConfig {
    GatewayConfig {
        output_location: "file:///tmp/results/".into(),
        default_database: "airbnb".into(),
        default_workgroup: "primary".into(),
        ..GatewayConfig::default()
    }
    .with_poll_interval(Duration::from_millis(1))
}

pub fn gateway(backend: &Arc<ScriptedBackend>) -> Gateway {
    gateway_with(config(), backend)
}

pub fn gateway_with(config: GatewayConfig, backend: &Arc<ScriptedBackend>) -> Gateway {
    let backend: Arc<dyn QueryBackend> = backend.clone();
    Gateway::new(config, backend)
}

pub fn sql_event(sql: &str) -> Value {
    json!({
        "actionGroup": "ask-bnb-sql-exec",
        "apiPath": "/run-sql",
        "httpMethod": "POST",
        "parameters": {"sql": sql}
    })
}

/// Header row followed by `n` data rows of `(id, name)`.
pub fn raw_rows(n: usize) -> RawResults {
    let mut rows = vec![vec![Some("id".to_string()), Some("name".to_string())]];
    for i in 1..=n {
        let name = if i % 2 == 0 { None } else { Some(format!("listing {i}")) };
        rows.push(vec![Some(i.to_string()), name]);
    }
    RawResults {
        column_labels: vec!["id".into(), "name".into()],
        rows,
    }
}

pub fn empty_body() -> Value {
    json!({"columns": [], "rows": [], "bytes_scanned": 0})
}

pub fn body_of(envelope: &sql_gateway::envelope::OutboundEnvelope) -> Value {
    serde_json::from_str(&envelope.response.response_body.application_json.body)
        .expect("body must be serialized JSON")
}
