//! Lexical SELECT-only filter.
//!
//! This is a coarse guard, not a parser: banned words inside string literals
//! or comments are only caught when they happen to be space-delimited, and
//! keywords glued to punctuation slip through. The backend runs statements
//! read-only as well.

use std::sync::OnceLock;

use regex::Regex;

pub const BANNED_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "merge", "create", "drop", "alter", "grant", "revoke",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotSelect,
    BannedKeyword(&'static str),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NotSelect => f.write_str("statement does not start with SELECT"),
            Rejection::BannedKeyword(kw) => write!(f, "banned keyword `{kw}`"),
        }
    }
}

pub fn validate(sql: &str) -> bool {
    check(sql).is_ok()
}

pub fn check(sql: &str) -> Result<(), Rejection> {
    if !select_prefix_regex().is_match(sql) {
        return Err(Rejection::NotSelect);
    }

    let low = sql.to_lowercase();
    match BANNED_KEYWORDS
        .iter()
        .copied()
        .find(|kw| low.contains(&format!(" {kw} ")) || low.starts_with(&format!("{kw} ")))
    {
        Some(kw) => Err(Rejection::BannedKeyword(kw)),
        None => Ok(()),
    }
}

fn select_prefix_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?is)^\s*select\b").expect("select regex should compile"))
}
