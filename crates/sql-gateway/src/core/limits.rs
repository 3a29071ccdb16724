use std::sync::OnceLock;

use regex::Regex;

/// Ensures the statement ends in a `LIMIT` no larger than `max_rows`.
///
/// Only a clause anchored at the very end of the text is considered; a
/// `LIMIT` inside a subquery or CTE is left alone and an outer one is
/// appended.
pub fn enforce_row_limit(sql: &str, max_rows: usize) -> String {
    let s = strip_terminator(sql);

    if let Some(caps) = trailing_limit_regex().captures(s) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            return s.to_string();
        };
        // Digits too long for u64 are certainly above the ceiling.
        let within = value
            .as_str()
            .parse::<u64>()
            .map(|n| n <= max_rows as u64)
            .unwrap_or(false);
        if within {
            return s.to_string();
        }
        let offset = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        return format!("{}LIMIT {max_rows}{offset}", &s[..whole.start()]);
    }

    format!("{s}\nLIMIT {max_rows}")
}

fn strip_terminator(sql: &str) -> &str {
    let s = sql.trim_end();
    match s.strip_suffix(';') {
        Some(rest) => rest.trim_end(),
        None => s,
    }
}

fn trailing_limit_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?is)\blimit\s+(\d+)(\s+offset\s+\d+)?\s*$")
            .expect("trailing limit regex should compile")
    })
}
