use serde_json::{Map, Value};

use crate::{
    config::GatewayConfig,
    core::types::{ParsedRequest, DEFAULT_MAX_WAIT_SECONDS},
    error::{AppError, AppResult},
};

pub type Fields = Map<String, Value>;

/// One way of locating request fields inside an inbound envelope.
pub type Strategy = fn(&Value) -> Option<Fields>;

/// Tried in order; the first non-empty mapping wins.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("parameters", from_parameters_object),
    ("parameters_json", from_parameters_json),
    ("request_body_properties", from_request_body_properties),
    ("parameters_list", from_parameters_list),
];

/// Locates the request fields. Never fails: an envelope no strategy
/// understands yields an empty mapping, which validation later rejects.
pub fn extract_fields(envelope: &Value) -> Fields {
    for (name, strategy) in STRATEGIES {
        if let Some(fields) = strategy(envelope).filter(|f| !f.is_empty()) {
            tracing::debug!(strategy = name, "request fields extracted");
            return fields;
        }
    }
    tracing::debug!("no extraction strategy matched; using empty request");
    Fields::new()
}

pub fn extract(envelope: &Value, config: &GatewayConfig) -> AppResult<ParsedRequest> {
    ParsedRequest::from_fields(&extract_fields(envelope), config)
}

impl ParsedRequest {
    pub fn from_fields(fields: &Fields, config: &GatewayConfig) -> AppResult<Self> {
        let sql = match fields.get("sql") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(AppError::MalformedInput(format!(
                    "sql must be a string, got {other}"
                )))
            }
        };

        Ok(Self {
            sql,
            database: string_or(fields, "database", &config.default_database),
            workgroup: string_or(fields, "workgroup", &config.default_workgroup),
            max_wait_seconds: max_wait_seconds(fields.get("max_wait_seconds"))?,
        })
    }
}

fn string_or(fields: &Fields, key: &str, default: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn max_wait_seconds(value: Option<&Value>) -> AppResult<u64> {
    let secs = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_MAX_WAIT_SECONDS),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    match secs {
        Some(s) => Ok(s.max(0) as u64),
        None => Err(AppError::MalformedInput(format!(
            "max_wait_seconds is not an integer: {}",
            value.map(Value::to_string).unwrap_or_default()
        ))),
    }
}

fn from_parameters_object(envelope: &Value) -> Option<Fields> {
    envelope.get("parameters")?.as_object().cloned()
}

fn from_parameters_json(envelope: &Value) -> Option<Fields> {
    let raw = envelope.get("parameters")?.as_str()?;
    let raw = if raw.is_empty() { "{}" } else { raw };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "parameters string is not valid JSON");
            None
        }
    }
}

fn from_request_body_properties(envelope: &Value) -> Option<Fields> {
    let props = envelope
        .pointer("/requestBody/content/application~1json/properties")?
        .as_array()?;
    Some(flatten_named_values(props))
}

fn from_parameters_list(envelope: &Value) -> Option<Fields> {
    let params = envelope.get("parameters")?.as_array()?;
    Some(flatten_named_values(params))
}

/// `[{name, value}, ...]` into a mapping; later duplicates win.
fn flatten_named_values(items: &[Value]) -> Fields {
    let mut out = Fields::new();
    for item in items {
        let Some(name) = item.get("name").and_then(Value::as_str) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let value = item.get("value").cloned().unwrap_or(Value::Null);
        out.insert(name.to_string(), value);
    }
    out
}
