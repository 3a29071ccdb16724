mod common;

use std::sync::Arc;

use common::{empty_body, gateway, raw_rows, ScriptedBackend};
use serde_json::{json, Value};
use sql_gateway::{adapters::stdio, core::types::QueryState};

#[tokio::test]
async fn answers_each_line_including_garbage() {
    let backend = Arc::new(ScriptedBackend {
        raw: raw_rows(2),
        ..ScriptedBackend::with_states(&[QueryState::Succeeded])
    });
    let gw = gateway(&backend);

    let input = concat!(
        r#"{"apiPath": "/run-sql", "parameters": {"sql": "SELECT id, name FROM listings"}}"#,
        "\n",
        "\n",
        "this is not json\r\n",
        r#"{"parameters": "{\"sql\": \"DROP TABLE listings\"}"}"#,
        "\n",
    );

    let out = stdio::serve(&gw, input.as_bytes(), Vec::new())
        .await
        .expect("serve");
    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).expect("each line is an envelope"))
        .collect();
    assert_eq!(lines.len(), 3);

    let bodies: Vec<Value> = lines
        .iter()
        .map(|env| {
            assert_eq!(env["messageVersion"], json!("1.0"));
            assert_eq!(env["response"]["httpStatusCode"], json!(200));
            let body = env["response"]["responseBody"]["application/json"]["body"]
                .as_str()
                .expect("string body");
            serde_json::from_str(body).expect("json body")
        })
        .collect();

    assert_eq!(
        bodies[0],
        json!({"columns": ["id", "name"], "rows": [["1", "listing 1"], ["2", ""]], "bytes_scanned": 0})
    );
    assert_eq!(bodies[1], empty_body());
    assert_eq!(bodies[2], empty_body());
    assert_eq!(lines[1]["response"]["apiPath"], json!("/run-sql"));
    assert_eq!(backend.calls().submitted.len(), 1);
}

#[tokio::test]
async fn empty_input_writes_nothing() {
    let backend = Arc::new(ScriptedBackend::default());
    let out = stdio::serve(&gateway(&backend), &b""[..], Vec::new())
        .await
        .expect("serve");
    assert!(out.is_empty());
}
