//! Business Insight Agent
//!
//! Runs one question through synthesis, execution and narration and folds
//! every outcome into an [`AnswerRecord`]. Nothing escapes as an error.

use crate::catalog::SchemaCatalog;
use crate::config::AssistantConfig;
use crate::error::InsightError;
use crate::execution::{ExecutionContext, QueryExecutor, RelationalStore, ResultSet};
use crate::llm::LanguageModel;
use crate::narrator::ResultNarrator;
use crate::synthesizer::{PatternSet, QuerySource, QuerySynthesizer, SynthesizedQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Answer to one question. Built once, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub request_id: Uuid,
    pub question: String,
    pub success: bool,
    pub synthesized_query: Option<String>,
    pub query_source: Option<QuerySource>,
    pub result_set: ResultSet,
    pub record_count: usize,
    pub narrative: String,
    pub narrative_degraded: bool,
    pub error_detail: Option<String>,
    pub elapsed_ms: u64,
    pub answered_at: DateTime<Utc>,
}

pub struct InsightAgent {
    synthesizer: QuerySynthesizer,
    executor: QueryExecutor,
    narrator: ResultNarrator,
}

impl InsightAgent {
    pub fn new(
        config: &AssistantConfig,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn RelationalStore>,
        catalog: Arc<SchemaCatalog>,
        patterns: Arc<PatternSet>,
    ) -> Self {
        let ctx = ExecutionContext {
            timeout: config.db_timeout,
            policy: config.statement_policy,
        };
        Self {
            synthesizer: QuerySynthesizer::new(
                model.clone(),
                catalog,
                patterns,
                config.llm_timeout,
            ),
            executor: QueryExecutor::new(store, ctx),
            narrator: ResultNarrator::new(model, config.llm_timeout),
        }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub async fn answer_question(&self, question: &str) -> AnswerRecord {
        let request_id = Uuid::new_v4();
        let span = info_span!("answer", %request_id);
        self.answer_inner(request_id, question).instrument(span).await
    }

    async fn answer_inner(&self, request_id: Uuid, question: &str) -> AnswerRecord {
        let start = Instant::now();
        info!("Processing question: {}", question);

        if question.trim().is_empty() {
            let e = InsightError::InvalidQuestion("question is empty".to_string());
            return failed_record(request_id, question, None, e, start);
        }

        info!("Generating SQL query...");
        let query = match self.synthesizer.synthesize(question.trim()).await {
            Ok(query) => query,
            Err(e) => return failed_record(request_id, question, None, e, start),
        };
        info!("Generated query: {}", preview(&query.sql, 100));

        info!("Executing query...");
        let results = match self.executor.execute(&query.sql).await {
            Ok(results) => results,
            Err(e) => return failed_record(request_id, question, Some(query), e, start),
        };

        info!("Analyzing results...");
        let narrative = self.narrator.narrate(question, &results).await;

        let record_count = results.len();
        AnswerRecord {
            request_id,
            question: question.to_string(),
            success: true,
            synthesized_query: Some(query.sql),
            query_source: Some(query.source),
            result_set: results,
            record_count,
            narrative: narrative.text,
            narrative_degraded: narrative.degraded,
            error_detail: None,
            elapsed_ms: start.elapsed().as_millis() as u64,
            answered_at: Utc::now(),
        }
    }
}

/// Record for a request that stopped before narration. The statement is kept
/// when synthesis got that far.
fn failed_record(
    request_id: Uuid,
    question: &str,
    query: Option<SynthesizedQuery>,
    e: InsightError,
    start: Instant,
) -> AnswerRecord {
    error!("Question failed: {}", e);
    let (synthesized_query, query_source) = match query {
        Some(query) => (Some(query.sql), Some(query.source)),
        None => (None, None),
    };
    AnswerRecord {
        request_id,
        question: question.to_string(),
        success: false,
        synthesized_query,
        query_source,
        result_set: ResultSet::empty(),
        record_count: 0,
        narrative: format!("Sorry, I couldn't process your question: {}", e),
        narrative_degraded: false,
        error_detail: Some(e.to_string()),
        elapsed_ms: start.elapsed().as_millis() as u64,
        answered_at: Utc::now(),
    }
}

fn preview(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    }
}

/// Questions used by the demo run and offered to new users.
pub fn sample_questions() -> Vec<&'static str> {
    vec![
        "What are the top 5 best-selling products by revenue?",
        "Show me total sales by month for this year",
        "Which customers have the highest total order value?",
        "What products are low in stock across all warehouses?",
        "How much revenue did we generate last month?",
        "Which product categories are most profitable?",
        "Show me pending orders that need attention",
        "What's our inventory turnover rate?",
        "Which warehouse has the highest sales volume?",
        "Show me customers with overdue payments",
    ]
}
