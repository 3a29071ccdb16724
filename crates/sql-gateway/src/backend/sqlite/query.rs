use base64::Engine;
use rusqlite::{types::ValueRef, Connection, Row};

use super::readonly::ensure_readonly;
use crate::error::AppResult;

/// Everything a finished statement produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub bytes_read: u64,
}

pub fn run_statement(conn: &Connection, sql: &str) -> AppResult<Captured> {
    let mut stmt = conn.prepare(sql)?;
    ensure_readonly(&stmt)?;

    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut bytes_read = 0u64;
    let mut r = stmt.query([])?;
    while let Some(row) = r.next()? {
        let (cells, n) = row_to_cells(row, width)?;
        bytes_read += n;
        rows.push(cells);
    }

    Ok(Captured {
        columns,
        rows,
        bytes_read,
    })
}

fn row_to_cells(row: &Row<'_>, width: usize) -> AppResult<(Vec<Option<String>>, u64)> {
    let mut out = Vec::with_capacity(width);
    let mut bytes = 0u64;
    for i in 0..width {
        let cell = match row.get_ref(i)? {
            ValueRef::Null => None,
            ValueRef::Integer(x) => {
                bytes += 8;
                Some(x.to_string())
            }
            ValueRef::Real(x) => {
                bytes += 8;
                Some(x.to_string())
            }
            ValueRef::Text(t) => {
                bytes += t.len() as u64;
                Some(String::from_utf8_lossy(t).into_owned())
            }
            ValueRef::Blob(b) => {
                bytes += b.len() as u64;
                Some(base64::engine::general_purpose::STANDARD.encode(b))
            }
        };
        out.push(cell);
    }
    Ok((out, bytes))
}
