//! Fast-path question patterns.
//!
//! A rule is data: keyword groups plus a canned statement. The predicate
//! holds when every group has at least one keyword contained in the
//! lower-cased question. Rules are tried in list order and the first match
//! wins.

use crate::error::{InsightError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    pub name: String,
    /// AND over groups, OR within a group.
    pub all_of: Vec<Vec<String>>,
    pub sql: String,
}

impl PatternRule {
    pub fn new(name: &str, all_of: &[&[&str]], sql: &str) -> Self {
        Self {
            name: name.to_string(),
            all_of: all_of
                .iter()
                .map(|group| group.iter().map(|k| k.to_string()).collect())
                .collect(),
            sql: sql.trim().to_string(),
        }
    }

    /// `question_lower` must already be lower-cased.
    pub fn matches(&self, question_lower: &str) -> bool {
        !self.all_of.is_empty()
            && self.all_of.iter().all(|group| {
                group
                    .iter()
                    .any(|keyword| question_lower.contains(&keyword.to_lowercase()))
            })
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(InsightError::Config("pattern rule with empty name".to_string()));
        }
        if self.sql.trim().is_empty() {
            return Err(InsightError::Config(format!("pattern '{}' has no SQL", self.name)));
        }
        if self.all_of.is_empty()
            || self
                .all_of
                .iter()
                .any(|g| g.is_empty() || g.iter().any(|k| k.trim().is_empty()))
        {
            return Err(InsightError::Config(format!(
                "pattern '{}' has an empty keyword group",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    pub rules: Vec<PatternRule>,
}

impl PatternSet {
    pub fn new(rules: Vec<PatternRule>) -> Result<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Parse a JSON rule list (`{"rules": [...]}`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let set: PatternSet = serde_json::from_str(json)?;
        Self::new(set.rules)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let set = Self::from_json_str(&json)?;
        info!("Loaded {} fast-path patterns from {:?}", set.rules.len(), path);
        Ok(set)
    }

    /// First rule whose predicate holds for `question`.
    pub fn find(&self, question: &str) -> Option<&PatternRule> {
        let question_lower = question.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&question_lower))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

pub const MONTHLY_BEST_SELLERS_SQL: &str = r#"
SELECT
    strftime('%Y-%m', so.order_date) AS month,
    p.product_name,
    SUM(soi.quantity) AS total_quantity,
    SUM(soi.line_total) AS total_revenue,
    COUNT(DISTINCT so.order_id) AS order_count
FROM sales_orders so
JOIN sales_order_items soi ON so.order_id = soi.order_id
JOIN products p ON soi.product_id = p.product_id
WHERE so.order_status != 'Cancelled'
GROUP BY strftime('%Y-%m', so.order_date), p.product_id, p.product_name
ORDER BY month DESC, total_revenue DESC
"#;

pub const TOP_PRODUCTS_BY_REVENUE_SQL: &str = r#"
SELECT
    p.product_name,
    SUM(soi.line_total) AS total_revenue,
    SUM(soi.quantity) AS total_quantity,
    COUNT(DISTINCT so.order_id) AS order_count
FROM sales_order_items soi
JOIN products p ON soi.product_id = p.product_id
JOIN sales_orders so ON soi.order_id = so.order_id
WHERE so.order_status != 'Cancelled'
GROUP BY p.product_id, p.product_name
ORDER BY total_revenue DESC
LIMIT 10
"#;

pub const MONTHLY_SALES_SQL: &str = r#"
SELECT
    strftime('%Y-%m', order_date) AS month,
    COUNT(*) AS order_count,
    SUM(total_amount) AS total_revenue,
    AVG(total_amount) AS avg_order_value
FROM sales_orders
WHERE order_status != 'Cancelled'
GROUP BY strftime('%Y-%m', order_date)
ORDER BY month DESC
LIMIT 12
"#;

pub const LOW_STOCK_SQL: &str = r#"
SELECT
    p.product_name,
    w.warehouse_name,
    i.quantity_on_hand,
    i.reorder_level,
    i.max_stock_level
FROM inventory i
JOIN products p ON i.product_id = p.product_id
JOIN warehouses w ON i.warehouse_id = w.warehouse_id
WHERE i.quantity_on_hand <= i.reorder_level
ORDER BY i.quantity_on_hand ASC
"#;

pub fn default_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new(
            "monthly_best_sellers",
            &[&["best seller"], &["month", "monthly"]],
            MONTHLY_BEST_SELLERS_SQL,
        ),
        PatternRule::new(
            "top_products_by_revenue",
            &[&["top"], &["product"], &["revenue"]],
            TOP_PRODUCTS_BY_REVENUE_SQL,
        ),
        PatternRule::new(
            "monthly_sales",
            &[&["sales by month", "monthly sales"]],
            MONTHLY_SALES_SQL,
        ),
        PatternRule::new(
            "low_stock",
            &[&["low stock", "low in stock", "reorder"]],
            LOW_STOCK_SQL,
        ),
    ]
}
