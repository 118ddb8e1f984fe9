//! SQLite Relational Store
//!
//! Opens a fresh connection per call on tokio's blocking pool. The
//! connection is dropped when the call returns, whatever the outcome.

use crate::config::StatementPolicy;
use crate::error::{InsightError, Result};
use crate::execution::engine::{ExecutionContext, RelationalStore};
use crate::execution::result::{ResultSet, Row};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, InterruptHandle, OpenFlags, Statement};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Interrupt handle of the connection a query runs on. Once cancelled, a
/// connection that opens later refuses to start.
#[derive(Default)]
struct InterruptSlot {
    state: Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    handle: Option<InterruptHandle>,
    cancelled: bool,
}

impl InterruptSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns false when the query was cancelled before the connection opened.
    fn register(&self, handle: InterruptHandle) -> bool {
        let mut state = self.lock();
        if state.cancelled {
            return false;
        }
        state.handle = Some(handle);
        true
    }

    fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    fn cancel(&self) {
        let mut state = self.lock();
        state.cancelled = true;
        if let Some(handle) = state.handle.take() {
            handle.interrupt();
        }
    }
}

#[async_trait]
impl RelationalStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn execute(&self, sql: &str, ctx: &ExecutionContext) -> Result<ResultSet> {
        let path = self.path.clone();
        let sql = normalize_statement(sql).to_string();
        let policy = ctx.policy;
        let timeout = ctx.timeout;
        let slot = Arc::new(InterruptSlot::default());

        let task_slot = slot.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            run_statement(&path, &sql, policy, &task_slot, timeout)
        });

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => joined
                .map_err(|e| InsightError::Execution(format!("query task failed: {}", e)))?,
            Err(_) => {
                slot.cancel();
                warn!("Query interrupted after {:?}", timeout);
                Err(InsightError::ExecutionTimeout(timeout))
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let ctx = ExecutionContext::default();
        let result = self.execute("SELECT 1 AS ok", &ctx).await?;
        Ok(result.len() == 1)
    }
}

/// Trailing semicolons are accepted; SQLite would otherwise see an empty
/// second statement.
fn normalize_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

fn open_connection(path: &Path, policy: StatementPolicy) -> Result<Connection> {
    let access = match policy {
        StatementPolicy::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
        StatementPolicy::AllowWrites => OpenFlags::SQLITE_OPEN_READ_WRITE,
    };
    let flags = access | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
    Connection::open_with_flags(path, flags).map_err(|e| {
        InsightError::Execution(format!("cannot open database {}: {}", path.display(), e))
    })
}

/// Prepares the only statement in `sql`. Whitespace and comments after it
/// are fine, a second statement is not.
fn prepare_single<'conn>(conn: &'conn Connection, sql: &str) -> Result<Statement<'conn>> {
    let mut batch = Batch::new(conn, sql);
    let stmt = batch
        .next()?
        .ok_or_else(|| InsightError::Execution("empty SQL statement".to_string()))?;
    match batch.next() {
        Ok(None) => Ok(stmt),
        _ => Err(InsightError::Execution(
            "You can only execute one statement at a time.".to_string(),
        )),
    }
}

fn run_statement(
    path: &Path,
    sql: &str,
    policy: StatementPolicy,
    slot: &InterruptSlot,
    timeout: Duration,
) -> Result<ResultSet> {
    let conn = open_connection(path, policy)?;
    if !slot.register(conn.get_interrupt_handle()) {
        return Err(InsightError::ExecutionTimeout(timeout));
    }

    let mut stmt = prepare_single(&conn, sql)?;
    if policy == StatementPolicy::ReadOnly && !stmt.readonly() {
        return Err(InsightError::Execution(
            "only read-only statements may be executed (writes are disabled)".to_string(),
        ));
    }

    // An interrupt only reaches statements already running.
    if slot.is_cancelled() {
        return Err(InsightError::ExecutionTimeout(timeout));
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut materialized = Vec::new();
    while let Some(row) = rows.next()? {
        if slot.is_cancelled() {
            return Err(InsightError::ExecutionTimeout(timeout));
        }
        let mut record = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            record.insert(column.clone(), to_json(row.get_ref(idx)?));
        }
        materialized.push(record);
    }
    debug!("Materialized {} rows x {} columns", materialized.len(), columns.len());

    Ok(ResultSet::new(columns, materialized))
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2);
            for b in bytes {
                let _ = write!(hex, "{:02x}", b);
            }
            serde_json::Value::String(hex)
        }
    }
}
