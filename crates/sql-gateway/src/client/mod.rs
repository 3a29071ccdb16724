//! Helpers for clients that show gateway results relayed through an agent's
//! free-text answer.

mod payload;
mod render;

use std::{fs::File, io::BufWriter, path::Path};

use crate::error::AppResult;

pub use payload::{locate_payload, AgentPayload, Table};
pub use render::{render_table, write_csv};

/// Text shown for one agent answer. When `csv_path` is given and the answer
/// carries a table, the table is exported there as well.
pub fn render_agent_text(text: &str, csv_path: Option<&Path>) -> AppResult<String> {
    let text = text.trim();
    let Some(payload) = locate_payload(text) else {
        if text.is_empty() {
            return Ok("(empty response)\n".to_string());
        }
        return Ok(format!("{text}\n"));
    };

    let mut out = String::new();
    if let Some(sql) = payload.sql() {
        out.push_str("SQL:\n");
        out.push_str(sql);
        out.push_str("\n\n");
    }

    match payload.table() {
        Some(table) => {
            out.push_str(&render_table(&table));
            out.push_str(&format!("({} rows)\n", table.rows.len()));
            if let Some(path) = csv_path {
                write_csv(&table, BufWriter::new(File::create(path)?))?;
                tracing::info!(path = %path.display(), rows = table.rows.len(), "table exported");
            }
        }
        None => {
            out.push_str(&serde_json::to_string_pretty(&payload.as_value())?);
            out.push('\n');
        }
    }
    Ok(out)
}
