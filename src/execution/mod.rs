//! Execution Module - runs synthesized statements against the relational store
//!
//! - RelationalStore trait for pluggable stores
//! - ResultSet for materialized rows
//! - SqliteStore, the store behind inventory_sales.db

pub mod engine;
pub mod result;
pub mod sqlite_engine;

pub use engine::{ExecutionContext, RelationalStore};
pub use result::{ResultSet, Row};
pub use sqlite_engine::SqliteStore;

use crate::error::{InsightError, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Query Executor: one attempt per statement, no retries.
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn RelationalStore>,
    ctx: ExecutionContext,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn RelationalStore>, ctx: ExecutionContext) -> Self {
        Self { store, ctx }
    }

    pub fn store(&self) -> &Arc<dyn RelationalStore> {
        &self.store
    }

    pub async fn execute(&self, sql: &str) -> Result<ResultSet> {
        let start = Instant::now();
        let result = self.store.execute(sql, &self.ctx).await.map_err(|e| {
            if e.is_execution_error() {
                e
            } else {
                InsightError::Execution(e.to_string())
            }
        })?;
        info!(
            "Found {} records on {} in {}ms",
            result.len(),
            self.store.name(),
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}
