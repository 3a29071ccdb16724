use serde_json::{Map, Value};

/// JSON object an agent embedded in its free-text answer, expected to look
/// like `{sql, columns, rows}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentPayload(Map<String, Value>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AgentPayload {
    pub fn sql(&self) -> Option<&str> {
        self.0.get("sql").and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// A table when `columns` is a non-empty list and `rows` a list. Rows may
    /// be lists (positional) or objects (keyed by column).
    pub fn table(&self) -> Option<Table> {
        let columns: Vec<String> = self
            .0
            .get("columns")?
            .as_array()?
            .iter()
            .map(cell_text)
            .collect();
        if columns.is_empty() {
            return None;
        }

        let rows = self
            .0
            .get("rows")?
            .as_array()?
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.iter().map(cell_text).collect(),
                Value::Object(obj) => columns
                    .iter()
                    .map(|c| obj.get(c).map(cell_text).unwrap_or_default())
                    .collect(),
                other => vec![cell_text(other)],
            })
            .collect();

        Some(Table { columns, rows })
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Finds the payload in agent text: the whole text, then each fenced code
/// block (an optional `json` tag is dropped), then the span from the first
/// `{` to the last `}`.
pub fn locate_payload(text: &str) -> Option<AgentPayload> {
    if let Some(p) = parse_object(text) {
        return Some(p);
    }

    if text.contains("```") {
        for part in text.split("```") {
            let candidate = part.trim();
            let candidate = match candidate.get(..4) {
                Some(tag) if tag.eq_ignore_ascii_case("json") => candidate[4..].trim(),
                _ => candidate,
            };
            if let Some(p) = parse_object(candidate) {
                return Some(p);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        return parse_object(&text[start..=end]);
    }
    None
}

fn parse_object(candidate: &str) -> Option<AgentPayload> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(AgentPayload(map)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn whole_text_json() {
        let p = locate_payload(r#"{"sql": "SELECT 1", "columns": ["n"], "rows": [["1"]]}"#)
            .expect("payload");
        assert_eq!(p.sql(), Some("SELECT 1"));
        assert_eq!(
            p.table(),
            Some(Table {
                columns: vec!["n".into()],
                rows: vec![vec!["1".into()]],
            })
        );
    }

    #[test]
    fn fenced_block_with_json_tag() {
        let text = "Here you go:\n```json\n{\"columns\": [\"a\", \"b\"], \"rows\": [[1, null]]}\n```\nAnything else?";
        let table = locate_payload(text).and_then(|p| p.table()).expect("table");
        assert_eq!(table.rows, vec![vec!["1".to_string(), String::new()]]);
    }

    #[test]
    fn brace_span_fallback() {
        let text = "Result: {\"sql\": \"SELECT 2\"} -- done";
        let p = locate_payload(text).expect("payload");
        assert_eq!(p.sql(), Some("SELECT 2"));
        assert!(p.table().is_none());
    }

    #[test]
    fn object_rows_follow_column_order() {
        let p = locate_payload(
            &json!({"columns": ["city", "price"], "rows": [{"price": 80, "city": "Madrid"}]})
                .to_string(),
        )
        .expect("payload");
        assert_eq!(
            p.table().expect("table").rows,
            vec![vec!["Madrid".to_string(), "80".into()]]
        );
    }

    #[test]
    fn no_payload_in_plain_text() {
        assert!(locate_payload("The cheapest neighbourhood is Villaverde.").is_none());
        assert!(locate_payload("} backwards {").is_none());
        assert!(locate_payload("[1, 2, 3]").is_none());
    }

    #[test]
    fn empty_columns_is_not_a_table() {
        let p = locate_payload(r#"{"columns": [], "rows": []}"#).expect("payload");
        assert!(p.table().is_none());
    }
}
