use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Error generating SQL query: {0}")]
    Generation(String),

    #[error("SQL generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("Database error: {0}")]
    Execution(String),

    #[error("Query execution timed out after {0:?}")]
    ExecutionTimeout(Duration),

    #[error("Interpretation failed: {0}")]
    Narration(String),

    #[error("Interpretation timed out after {0:?}")]
    NarrationTimeout(Duration),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightError {
    /// True for failures raised while producing a statement.
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            InsightError::Generation(_) | InsightError::GenerationTimeout(_)
        )
    }

    /// True for failures raised by the relational store.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            InsightError::Execution(_) | InsightError::ExecutionTimeout(_)
        )
    }
}

impl From<rusqlite::Error> for InsightError {
    fn from(err: rusqlite::Error) -> Self {
        InsightError::Execution(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
