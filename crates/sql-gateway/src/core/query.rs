use crate::core::{
    guard::{self, Rejection},
    limits::enforce_row_limit,
};

/// A statement that passed the SELECT-only filter and carries a trailing
/// `LIMIT` no larger than the row ceiling it was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    sql: String,
    max_rows: usize,
}

impl ValidatedQuery {
    pub fn new(sql: &str, max_rows: usize) -> Result<Self, Rejection> {
        guard::check(sql)?;
        Ok(Self {
            sql: enforce_row_limit(sql, max_rows),
            max_rows,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_before_rewriting() {
        let q = ValidatedQuery::new("select name from hosts;", 50).expect("valid select");
        assert_eq!(q.sql(), "select name from hosts\nLIMIT 50");
        assert_eq!(q.max_rows(), 50);

        assert_eq!(
            ValidatedQuery::new("UPDATE hosts SET name = 'x'", 50),
            Err(Rejection::NotSelect)
        );
    }
}
