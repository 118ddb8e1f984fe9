//! Headline business KPIs read straight from the store.

use crate::error::{InsightError, Result};
use crate::execution::QueryExecutor;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSnapshot {
    pub total_products: i64,
    pub total_customers: i64,
    pub total_orders: i64,
    pub total_revenue: f64,
    pub pending_orders: i64,
    pub low_stock_items: i64,
}

const ACTIVE_PRODUCTS_SQL: &str = "SELECT COUNT(*) AS value FROM products WHERE is_active = 1";
const CUSTOMERS_SQL: &str = "SELECT COUNT(*) AS value FROM customers";
const ORDERS_SQL: &str = "SELECT COUNT(*) AS value FROM sales_orders";
const REVENUE_SQL: &str = "SELECT COALESCE(SUM(total_amount), 0) AS value FROM sales_orders WHERE order_status != 'Cancelled'";
const PENDING_ORDERS_SQL: &str = "SELECT COUNT(*) AS value FROM sales_orders WHERE order_status = 'Pending'";
const LOW_STOCK_SQL: &str = "SELECT COUNT(*) AS value FROM inventory WHERE quantity_on_hand <= reorder_level";

impl BusinessSnapshot {
    pub async fn collect(executor: &QueryExecutor) -> Result<Self> {
        let snapshot = Self {
            total_products: scalar(executor, ACTIVE_PRODUCTS_SQL).await?.round() as i64,
            total_customers: scalar(executor, CUSTOMERS_SQL).await?.round() as i64,
            total_orders: scalar(executor, ORDERS_SQL).await?.round() as i64,
            total_revenue: scalar(executor, REVENUE_SQL).await?,
            pending_orders: scalar(executor, PENDING_ORDERS_SQL).await?.round() as i64,
            low_stock_items: scalar(executor, LOW_STOCK_SQL).await?.round() as i64,
        };
        info!("Collected business snapshot: {:?}", snapshot);
        Ok(snapshot)
    }
}

async fn scalar(executor: &QueryExecutor, sql: &str) -> Result<f64> {
    let result = executor.execute(sql).await?;
    result
        .rows
        .first()
        .and_then(|row| row.get("value"))
        .and_then(|value| value.as_f64())
        .ok_or_else(|| InsightError::Execution(format!("KPI query returned no number: {}", sql)))
}
