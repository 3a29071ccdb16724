use rusqlite::Statement;

use crate::error::{AppError, AppResult};

/// Rejects statements SQLite itself reports as writing to the database.
pub fn ensure_readonly(stmt: &Statement<'_>) -> AppResult<()> {
    if stmt.readonly() {
        Ok(())
    } else {
        Err(AppError::Backend("statement is not read-only".into()))
    }
}
