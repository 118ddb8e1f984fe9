//! Query Synthesizer
//!
//! Turns a business question into one executable SQL statement: canned
//! statements for recognized questions, otherwise a single model call whose
//! output is cleaned and validated.

pub mod cleanup;
pub mod patterns;

use crate::catalog::SchemaCatalog;
use crate::error::{InsightError, Result};
use crate::llm::{CompletionParams, LanguageModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub use cleanup::{clean_model_output, CleanupStep, SQL_KEYWORDS};
pub use patterns::{PatternRule, PatternSet};

/// Where a synthesized statement came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuerySource {
    FastPath { rule: String },
    Model { model: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedQuery {
    pub sql: String,
    pub source: QuerySource,
}

pub struct QuerySynthesizer {
    model: Arc<dyn LanguageModel>,
    catalog: Arc<SchemaCatalog>,
    patterns: Arc<PatternSet>,
    timeout: Duration,
}

impl QuerySynthesizer {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        catalog: Arc<SchemaCatalog>,
        patterns: Arc<PatternSet>,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            catalog,
            patterns,
            timeout,
        }
    }

    pub async fn synthesize(&self, question: &str) -> Result<SynthesizedQuery> {
        if let Some(rule) = self.patterns.find(question) {
            info!("Fast-path match: {}", rule.name);
            return Ok(SynthesizedQuery {
                sql: rule.sql.trim().to_string(),
                source: QuerySource::FastPath {
                    rule: rule.name.clone(),
                },
            });
        }

        let prompt = self.build_prompt(question);
        let raw = match tokio::time::timeout(
            self.timeout,
            self.model.invoke(&prompt, CompletionParams::generation()),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(InsightError::Generation(e.to_string())),
            Err(_) => return Err(InsightError::GenerationTimeout(self.timeout)),
        };
        debug!("Raw model output: {:?}", raw);

        let sql = cleanup::validate(&clean_model_output(&raw))?;
        Ok(SynthesizedQuery {
            sql,
            source: QuerySource::Model {
                model: self.model.name().to_string(),
            },
        })
    }

    pub fn build_prompt(&self, question: &str) -> String {
        format!(
            r#"You are a SQL expert for a business inventory and sales database.
Convert the following business question into a SQL query.

{}

CRITICAL RULES:
1. Return ONLY the SQL query - NO explanations, NO comments, NO extra text
2. Generate ONLY valid SQLite SQL queries
3. Use proper JOINs when accessing related tables
4. Include appropriate WHERE clauses for filtering
5. Use aggregate functions (SUM, COUNT, AVG) when needed
6. Format dates properly for SQLite using strftime()
7. Always include column aliases for clarity
8. Limit results to reasonable numbers (use LIMIT if needed)
9. Start directly with SELECT, not with "Here is" or any explanation

QUESTION: {}

SQL:"#,
            self.catalog.render(),
            question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedModel {
        reply: std::result::Result<String, String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn invoke(&self, _prompt: &str, params: CompletionParams) -> Result<String> {
            assert_eq!(params, CompletionParams::generation());
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map_err(InsightError::Llm)
        }
    }

    fn synthesizer(model: Arc<FixedModel>) -> QuerySynthesizer {
        QuerySynthesizer::new(
            model,
            Arc::new(SchemaCatalog::inventory_sales()),
            Arc::new(PatternSet::default()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_fast_path_skips_model() {
        let model = FixedModel::failing("model must not be called");
        let synth = synthesizer(model.clone());

        let query = synth.synthesize("Which items need a reorder?").await.unwrap();
        assert_eq!(query.sql, patterns::LOW_STOCK_SQL.trim());
        assert_eq!(
            query.source,
            QuerySource::FastPath {
                rule: "low_stock".to_string()
            }
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_output_is_cleaned() {
        let model = FixedModel::replying("Here's the SQL query:\n```sql\nSELECT 1\n```");
        let synth = synthesizer(model.clone());

        let query = synth.synthesize("How many customers do we have?").await.unwrap();
        assert_eq!(query.sql, "SELECT 1");
        assert_eq!(
            query.source,
            QuerySource::Model {
                model: "fixed".to_string()
            }
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prose_output_is_generation_error() {
        let synth = synthesizer(FixedModel::replying("I'm not sure what you mean."));
        let err = synth.synthesize("Tell me a joke").await.unwrap_err();
        assert!(err.is_generation_error());
    }

    #[tokio::test]
    async fn test_model_failure_is_generation_error() {
        let synth = synthesizer(FixedModel::failing("connection refused"));
        let err = synth.synthesize("How many customers?").await.unwrap_err();
        assert!(matches!(err, InsightError::Generation(ref m) if m.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let model = Arc::new(FixedModel {
            reply: Ok("SELECT 1".to_string()),
            delay: Duration::from_secs(2),
            calls: AtomicUsize::new(0),
        });
        let synth = QuerySynthesizer::new(
            model,
            Arc::new(SchemaCatalog::inventory_sales()),
            Arc::new(PatternSet::empty()),
            Duration::from_millis(50),
        );
        let err = synth.synthesize("anything").await.unwrap_err();
        assert!(matches!(err, InsightError::GenerationTimeout(d) if d == Duration::from_millis(50)));
        assert!(err.to_string().contains("50ms"));
    }

    #[test]
    fn test_prompt_embeds_schema_and_question() {
        let synth = synthesizer(FixedModel::replying("SELECT 1"));
        let prompt = synth.build_prompt("Which warehouse ships the most?");
        assert!(prompt.contains("sales_order_items"));
        assert!(prompt.contains("QUESTION: Which warehouse ships the most?"));
        assert!(prompt.trim_end().ends_with("SQL:"));
    }
}
