//! Relational Store Trait - contract for anything that can run a statement
//!
//! The pipeline only needs `execute(statement) -> rows + columns | error`.

use crate::config::StatementPolicy;
use crate::error::Result;
use crate::execution::result::ResultSet;
use async_trait::async_trait;
use std::time::Duration;

/// Per-call execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    pub timeout: Duration,
    pub policy: StatementPolicy,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            policy: StatementPolicy::ReadOnly,
        }
    }
}

#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Store name (e.g. "sqlite")
    fn name(&self) -> &'static str;

    /// Run one statement and materialize every row.
    ///
    /// All failures are `Execution` / `ExecutionTimeout` errors carrying the
    /// store's own message.
    async fn execute(&self, sql: &str, ctx: &ExecutionContext) -> Result<ResultSet>;

    /// Check the store is reachable.
    async fn health_check(&self) -> Result<bool>;
}
