use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::ResultSet;

pub const MESSAGE_VERSION: &str = "1.0";
pub const DEFAULT_ACTION_GROUP: &str = "ask-bnb-sql-exec";
pub const DEFAULT_API_PATH: &str = "/run-sql";
pub const DEFAULT_HTTP_METHOD: &str = "POST";

const EMPTY_BODY: &str = r#"{"columns":[],"rows":[],"bytes_scanned":0}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
    pub message_version: String,
    pub response: ActionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub action_group: String,
    pub api_path: String,
    pub http_method: String,
    pub http_status_code: u16,
    pub response_body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(rename = "application/json")]
    pub application_json: JsonBody,
}

/// The orchestrator requires `body` to be a string holding serialized JSON,
/// not a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonBody {
    pub body: String,
}

impl OutboundEnvelope {
    pub fn status(&self) -> u16 {
        self.response.http_status_code
    }

    /// Decodes the serialized payload back into a result set.
    pub fn payload(&self) -> serde_json::Result<ResultSet> {
        serde_json::from_str(&self.response.response_body.application_json.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub action_group: String,
    pub api_path: String,
    pub http_method: String,
}

/// Each field falls back from the envelope top level to `requestContext`
/// to a fixed default. Empty strings count as absent.
pub fn resolve_routing(envelope: &Value) -> Routing {
    let rc = envelope.get("requestContext");
    let top = |key: &str| non_empty_str(envelope.get(key));
    let ctx = |key: &str| non_empty_str(rc.and_then(|rc| rc.get(key)));

    Routing {
        action_group: top("actionGroup")
            .or_else(|| top("actionGroupName"))
            .or_else(|| ctx("actionGroup"))
            .unwrap_or(DEFAULT_ACTION_GROUP)
            .to_string(),
        api_path: top("apiPath")
            .or_else(|| ctx("apiPath"))
            .unwrap_or(DEFAULT_API_PATH)
            .to_string(),
        http_method: top("httpMethod")
            .or_else(|| ctx("httpMethod"))
            .unwrap_or(DEFAULT_HTTP_METHOD)
            .to_string(),
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub fn wrap(payload: &ResultSet, envelope: &Value, status: u16) -> OutboundEnvelope {
    let routing = resolve_routing(envelope);
    let body = match serde_json::to_string(payload) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize payload; sending empty result");
            EMPTY_BODY.to_string()
        }
    };

    OutboundEnvelope {
        message_version: MESSAGE_VERSION.to_string(),
        response: ActionResponse {
            action_group: routing.action_group,
            api_path: routing.api_path,
            http_method: routing.http_method,
            http_status_code: status,
            response_body: ResponseBody {
                application_json: JsonBody { body },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_to_the_fixed_wire_shape() {
        let payload = ResultSet {
            columns: vec!["neighbourhood".into()],
            rows: vec![vec!["Centro".into()]],
            bytes_scanned: 512,
        };
        let out = wrap(&payload, &json!({"apiPath": "/query"}), 200);
        let v = serde_json::to_value(&out).expect("serialize");

        assert_eq!(v["messageVersion"], json!("1.0"));
        assert_eq!(v["response"]["actionGroup"], json!(DEFAULT_ACTION_GROUP));
        assert_eq!(v["response"]["apiPath"], json!("/query"));
        assert_eq!(v["response"]["httpMethod"], json!("POST"));
        assert_eq!(v["response"]["httpStatusCode"], json!(200));

        let body = v
            .pointer("/response/responseBody/application~1json/body")
            .and_then(Value::as_str)
            .expect("body must be a string");
        let decoded: Value = serde_json::from_str(body).expect("body is JSON");
        assert_eq!(
            decoded,
            json!({"columns": ["neighbourhood"], "rows": [["Centro"]], "bytes_scanned": 512})
        );
    }

    #[test]
    fn routing_falls_back_through_request_context() {
        let env = json!({
            "actionGroup": "",
            "actionGroupName": "sql-tools",
            "httpMethod": "GET",
            "requestContext": {"apiPath": "/ctx-path", "httpMethod": "PUT"}
        });
        assert_eq!(
            resolve_routing(&env),
            Routing {
                action_group: "sql-tools".into(),
                api_path: "/ctx-path".into(),
                http_method: "GET".into(),
            }
        );

        let env = json!({"requestContext": {"actionGroup": "from-ctx"}});
        assert_eq!(resolve_routing(&env).action_group, "from-ctx");
    }

    #[test]
    fn non_object_envelope_uses_defaults() {
        let routing = resolve_routing(&Value::Null);
        assert_eq!(routing.action_group, DEFAULT_ACTION_GROUP);
        assert_eq!(routing.api_path, DEFAULT_API_PATH);
        assert_eq!(routing.http_method, DEFAULT_HTTP_METHOD);
    }

    #[test]
    fn empty_result_round_trips_through_the_body() {
        let out = wrap(&ResultSet::empty(), &json!({}), 200);
        let body: Value =
            serde_json::from_str(&out.response.response_body.application_json.body).expect("json");
        assert_eq!(body, json!({"columns": [], "rows": [], "bytes_scanned": 0}));
        assert_eq!(out.payload().expect("payload"), ResultSet::empty());
        assert_eq!(
            serde_json::from_str::<Value>(EMPTY_BODY).expect("json"),
            body
        );
    }
}
