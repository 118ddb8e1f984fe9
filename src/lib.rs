pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod execution;
pub mod llm;
pub mod narrator;
pub mod snapshot;
pub mod synthesizer;

pub use agent::{sample_questions, AnswerRecord, InsightAgent};
pub use catalog::SchemaCatalog;
pub use config::{AssistantConfig, StatementPolicy};
pub use error::{InsightError, Result};
pub use execution::{QueryExecutor, RelationalStore, ResultSet, SqliteStore};
pub use llm::{CompletionParams, LanguageModel, LlmClient};
