//! Result Set - materialized rows returned by the relational store

use serde::{Deserialize, Serialize};

/// One row: column name to value, in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in statement order; empty for statements without a
    /// result description.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render one row as `col: value | col: value`.
    pub fn render_row(&self, row: &Row) -> String {
        self.columns
            .iter()
            .map(|col| {
                let value = row.get(col).unwrap_or(&serde_json::Value::Null);
                format!("{}: {}", col, display_value(value))
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Strings without quotes, nulls as `None`, everything else as JSON.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
