//! Normalization of raw model output into a bare SQL statement.
//!
//! Steps run in a fixed order; each one is a plain `&str -> String`
//! function so it can be exercised on its own.

use crate::error::{InsightError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

/// Statement keywords accepted at the start of a synthesized query.
pub const SQL_KEYWORDS: [&str; 6] = ["SELECT", "WITH", "CREATE", "INSERT", "UPDATE", "DELETE"];

/// Preambles models like to put in front of the statement, checked in order.
pub const KNOWN_PREFIXES: [&str; 8] = [
    "Here is the SQL query:",
    "Here's the SQL query:",
    "SQL Query:",
    "The SQL query is:",
    "Query:",
    "SQL:",
    "Here is",
    "Here's",
];

lazy_static! {
    static ref SQL_FENCE: Regex = Regex::new(r"(?i)```sql\n?").expect("valid fence regex");
    static ref BARE_FENCE: Regex = Regex::new(r"```\n?").expect("valid fence regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    StripFences,
    StripKnownPrefixes,
    SkipToFirstKeywordLine,
}

impl CleanupStep {
    pub fn name(&self) -> &'static str {
        match self {
            CleanupStep::StripFences => "strip_fences",
            CleanupStep::StripKnownPrefixes => "strip_known_prefixes",
            CleanupStep::SkipToFirstKeywordLine => "skip_to_first_keyword_line",
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            CleanupStep::StripFences => strip_fences(text),
            CleanupStep::StripKnownPrefixes => strip_known_prefixes(text),
            CleanupStep::SkipToFirstKeywordLine => skip_to_first_keyword_line(text),
        }
    }
}

pub const PIPELINE: [CleanupStep; 3] = [
    CleanupStep::StripFences,
    CleanupStep::StripKnownPrefixes,
    CleanupStep::SkipToFirstKeywordLine,
];

/// Remove every ```` ```sql ```` and ```` ``` ```` marker.
pub fn strip_fences(text: &str) -> String {
    let without_sql = SQL_FENCE.replace_all(text.trim(), "");
    BARE_FENCE.replace_all(&without_sql, "").into_owned()
}

/// Drop known preambles from the start of the text.
pub fn strip_known_prefixes(text: &str) -> String {
    let mut current = text.trim().to_string();
    for prefix in KNOWN_PREFIXES {
        let has_prefix = current
            .get(..prefix.len())
            .map(|head| head.eq_ignore_ascii_case(prefix))
            .unwrap_or(false);
        if has_prefix {
            current = current[prefix.len()..].trim().to_string();
        }
    }
    current
}

/// Discard lines until one starts with a SQL keyword, keep everything from
/// there on. Text without any such line is returned unchanged.
pub fn skip_to_first_keyword_line(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    match lines.iter().position(|line| starts_with_sql_keyword(line)) {
        Some(start) => lines[start..].join("\n").trim().to_string(),
        None => text.to_string(),
    }
}

/// Case-insensitive keyword test with a word boundary, so "Without" or
/// "Selection" do not count.
pub fn starts_with_sql_keyword(text: &str) -> bool {
    let text = text.trim_start();
    SQL_KEYWORDS.iter().any(|keyword| {
        let Some(head) = text.get(..keyword.len()) else {
            return false;
        };
        head.eq_ignore_ascii_case(keyword)
            && text[keyword.len()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}

/// Run every cleanup step in order.
pub fn clean_model_output(raw: &str) -> String {
    PIPELINE.iter().fold(raw.to_string(), |text, step| {
        let next = step.apply(&text);
        trace!(step = step.name(), "{:?} -> {:?}", text, next);
        next
    })
}

/// Final gate: the statement must open with a recognized keyword.
pub fn validate(sql: &str) -> Result<String> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(InsightError::Generation(
            "Model returned no SQL statement".to_string(),
        ));
    }
    if !starts_with_sql_keyword(sql) {
        return Err(InsightError::Generation(
            "Generated query doesn't start with a valid SQL command".to_string(),
        ));
    }
    Ok(sql.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```sql\nSELECT 1\n```"), "SELECT 1\n");
        assert_eq!(strip_fences("```SQL\nSELECT 1```"), "SELECT 1");
        assert_eq!(strip_fences("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_strip_known_prefixes() {
        assert_eq!(strip_known_prefixes("SQL: SELECT 1"), "SELECT 1");
        assert_eq!(strip_known_prefixes("here is the sql query:\nSELECT 1"), "SELECT 1");
        assert_eq!(strip_known_prefixes("SQL Query: SELECT 1"), "SELECT 1");
        assert_eq!(strip_known_prefixes("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_skip_to_first_keyword_line() {
        let text = "Sure thing!\nThis joins two tables.\nSELECT name\nFROM products";
        assert_eq!(skip_to_first_keyword_line(text), "SELECT name\nFROM products");

        let no_sql = "I cannot answer that.";
        assert_eq!(skip_to_first_keyword_line(no_sql), no_sql);
    }

    #[test]
    fn test_keyword_boundary() {
        assert!(starts_with_sql_keyword("select * from t"));
        assert!(starts_with_sql_keyword("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(starts_with_sql_keyword("SELECT"));
        assert!(!starts_with_sql_keyword("Without a doubt"));
        assert!(!starts_with_sql_keyword("Selection of rows"));
    }

    #[test]
    fn test_pipeline_on_fenced_preamble() {
        let raw = "Here's the SQL query:\n```sql\nSELECT 1\n```";
        assert_eq!(clean_model_output(raw), "SELECT 1");
    }

    #[test]
    fn test_pipeline_on_fence_only() {
        let raw = "```sql\nSELECT p.product_name\nFROM products p\n```";
        assert_eq!(
            validate(&clean_model_output(raw)).unwrap(),
            "SELECT p.product_name\nFROM products p"
        );
    }

    #[test]
    fn test_pipeline_with_prose_lines() {
        let raw = "To answer this we need orders.\n\n```\nWITH t AS (SELECT 1 AS n)\nSELECT n FROM t\n```\n";
        let cleaned = clean_model_output(raw);
        assert!(cleaned.starts_with("WITH t AS"));
        assert!(cleaned.ends_with("SELECT n FROM t"));
    }

    #[test]
    fn test_validate_rejects_prose_and_empty() {
        assert!(matches!(validate(""), Err(InsightError::Generation(_))));
        assert!(matches!(
            validate(&clean_model_output("I don't know.")),
            Err(InsightError::Generation(_))
        ));
        assert!(matches!(
            validate(&clean_model_output("```sql\n```")),
            Err(InsightError::Generation(_))
        ));
    }
}
