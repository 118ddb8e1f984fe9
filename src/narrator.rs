//! Result Narrator
//!
//! Turns a result set into a short business summary. Never fails: when the
//! model call does not work out, the narrative carries the error and a raw
//! preview instead.

use crate::error::{InsightError, Result};
use crate::execution::ResultSet;
use crate::llm::{CompletionParams, LanguageModel};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const NO_DATA_MESSAGE: &str = "No data found for your query.";

/// Result sets up to this size are shown to the model in full.
const FULL_LISTING_LIMIT: usize = 10;
/// Rows shown for larger result sets.
const SUMMARY_LISTING_ROWS: usize = 5;
/// Rows echoed in the degraded fallback.
const FALLBACK_PREVIEW_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    /// Set when the model could not be used and `text` is the fallback.
    pub degraded: bool,
}

pub struct ResultNarrator {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl ResultNarrator {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub async fn narrate(&self, question: &str, results: &ResultSet) -> Narrative {
        if results.is_empty() {
            return Narrative {
                text: NO_DATA_MESSAGE.to_string(),
                degraded: false,
            };
        }

        match self.interpret(question, results).await {
            Ok(text) => Narrative {
                text,
                degraded: false,
            },
            Err(e) => {
                warn!("Narration degraded: {}", e);
                Narrative {
                    text: fallback_text(&e, results),
                    degraded: true,
                }
            }
        }
    }

    async fn interpret(&self, question: &str, results: &ResultSet) -> Result<String> {
        let prompt = build_prompt(question, results);
        let response = tokio::time::timeout(
            self.timeout,
            self.model.invoke(&prompt, CompletionParams::narration()),
        )
        .await
        .map_err(|_| InsightError::NarrationTimeout(self.timeout))?
        .map_err(|e| InsightError::Narration(e.to_string()))?;

        let text = response.trim();
        if text.is_empty() {
            return Err(InsightError::Narration("model returned an empty summary".to_string()));
        }
        Ok(text.to_string())
    }
}

/// Rows rendered for the prompt: all of them up to the listing limit,
/// otherwise a count plus the first few.
pub fn render_results(results: &ResultSet) -> String {
    let lines = |take: usize| {
        results
            .rows
            .iter()
            .take(take)
            .enumerate()
            .map(|(i, row)| format!("{}. {}", i + 1, results.render_row(row)))
            .join("\n")
    };

    if results.len() <= FULL_LISTING_LIMIT {
        lines(FULL_LISTING_LIMIT)
    } else {
        format!(
            "Found {} records. Here are the first {}:\n{}",
            results.len(),
            SUMMARY_LISTING_ROWS,
            lines(SUMMARY_LISTING_ROWS)
        )
    }
}

pub fn build_prompt(question: &str, results: &ResultSet) -> String {
    format!(
        r#"You are a business analyst. Interpret the following query results and provide insights.

ORIGINAL QUESTION: {}

QUERY RESULTS ({} records):
{}

INSTRUCTIONS:
1. Provide a clear, concise summary of the findings
2. Highlight key insights and trends
3. Use business language, not technical jargon
4. Include specific numbers and percentages where relevant
5. Suggest actionable recommendations if appropriate
6. Keep response under 200 words

BUSINESS ANALYSIS:"#,
        question,
        results.len(),
        render_results(results)
    )
}

fn fallback_text(error: &InsightError, results: &ResultSet) -> String {
    let preview: Vec<_> = results.rows.iter().take(FALLBACK_PREVIEW_ROWS).collect();
    let preview = serde_json::to_string(&preview).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Results found but interpretation failed: {}\n\nRaw results: {}...",
        error, preview
    )
}
