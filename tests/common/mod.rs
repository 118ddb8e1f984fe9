#![allow(dead_code)]

use async_trait::async_trait;
use inventory_insight::config::{AssistantConfig, StatementPolicy};
use inventory_insight::error::{InsightError, Result};
use inventory_insight::llm::{CompletionParams, LanguageModel};
use inventory_insight::{InsightAgent, SchemaCatalog, SqliteStore};
use inventory_insight::synthesizer::PatternSet;
use rusqlite::Connection;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Model that plays back queued replies and records every prompt.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<(String, CompletionParams)>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(replies: Vec<std::result::Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<(String, CompletionParams)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, prompt: &str, params: CompletionParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push((prompt.to_string(), params));
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply.map_err(InsightError::Llm),
            None => Err(InsightError::Llm("no scripted reply left".to_string())),
        }
    }
}

/// Temporary inventory_sales database with a handful of rows.
pub struct Fixture {
    pub dir: TempDir,
    pub db_path: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("inventory_sales.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(SCHEMA_AND_DATA).unwrap();
        Self { dir, db_path }
    }

    pub fn config(&self) -> AssistantConfig {
        AssistantConfig {
            db_path: self.db_path.clone(),
            api_key: Some("test-key".to_string()),
            llm_timeout: Duration::from_secs(5),
            db_timeout: Duration::from_secs(5),
            statement_policy: StatementPolicy::ReadOnly,
            ..AssistantConfig::default()
        }
    }

    pub fn agent(&self, model: Arc<ScriptedModel>) -> InsightAgent {
        self.agent_with(model, self.config())
    }

    pub fn agent_with(&self, model: Arc<ScriptedModel>, config: AssistantConfig) -> InsightAgent {
        InsightAgent::new(
            &config,
            model,
            Arc::new(SqliteStore::new(config.db_path.clone())),
            Arc::new(SchemaCatalog::inventory_sales()),
            Arc::new(PatternSet::default()),
        )
    }

    pub fn count(&self, table: &str) -> i64 {
        let conn = Connection::open(&self.db_path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }
}

const SCHEMA_AND_DATA: &str = r#"
CREATE TABLE categories (
    category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_name TEXT NOT NULL,
    description TEXT
);
CREATE TABLE suppliers (
    supplier_id INTEGER PRIMARY KEY AUTOINCREMENT,
    supplier_name TEXT NOT NULL,
    country TEXT
);
CREATE TABLE products (
    product_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_name TEXT NOT NULL,
    product_code TEXT UNIQUE,
    category_id INTEGER REFERENCES categories(category_id),
    supplier_id INTEGER REFERENCES suppliers(supplier_id),
    unit_price DECIMAL(10,2),
    cost_price DECIMAL(10,2),
    is_active BOOLEAN DEFAULT 1
);
CREATE TABLE warehouses (
    warehouse_id INTEGER PRIMARY KEY AUTOINCREMENT,
    warehouse_name TEXT NOT NULL,
    location TEXT
);
CREATE TABLE inventory (
    inventory_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER REFERENCES products(product_id),
    warehouse_id INTEGER REFERENCES warehouses(warehouse_id),
    quantity_on_hand INTEGER DEFAULT 0,
    quantity_reserved INTEGER DEFAULT 0,
    reorder_level INTEGER DEFAULT 10,
    max_stock_level INTEGER DEFAULT 1000
);
CREATE TABLE customers (
    customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_name TEXT NOT NULL,
    customer_type TEXT
);
CREATE TABLE sales_orders (
    order_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_number TEXT UNIQUE,
    customer_id INTEGER REFERENCES customers(customer_id),
    warehouse_id INTEGER REFERENCES warehouses(warehouse_id),
    order_date DATE,
    order_status TEXT,
    payment_status TEXT,
    total_amount DECIMAL(12,2)
);
CREATE TABLE sales_order_items (
    order_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER REFERENCES sales_orders(order_id),
    product_id INTEGER REFERENCES products(product_id),
    quantity INTEGER,
    unit_price DECIMAL(10,2),
    discount_percentage DECIMAL(5,2) DEFAULT 0,
    line_total DECIMAL(12,2)
);
CREATE TABLE inventory_movements (
    movement_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER REFERENCES products(product_id),
    warehouse_id INTEGER REFERENCES warehouses(warehouse_id),
    movement_type TEXT,
    quantity INTEGER,
    movement_date DATETIME,
    reference_type TEXT
);

INSERT INTO categories (category_name) VALUES ('Electronics'), ('Office');
INSERT INTO suppliers (supplier_name, country) VALUES ('Acme', 'USA');
INSERT INTO products (product_name, product_code, category_id, supplier_id, unit_price, cost_price, is_active) VALUES
    ('Laptop', 'P-001', 1, 1, 1200, 900, 1),
    ('Mouse', 'P-002', 1, 1, 25, 10, 1),
    ('Desk Lamp', 'P-003', 2, 1, 40, 22, 1),
    ('Old Fax', 'P-004', 1, 1, 80, 60, 0);
INSERT INTO warehouses (warehouse_name, location) VALUES ('North Hub', 'Chicago'), ('South Hub', 'Dallas');
INSERT INTO inventory (product_id, warehouse_id, quantity_on_hand, reorder_level, max_stock_level) VALUES
    (1, 1, 3, 10, 100),
    (2, 1, 500, 50, 1000),
    (3, 2, 0, 5, 60),
    (2, 2, 50, 50, 800);
INSERT INTO customers (customer_name, customer_type) VALUES ('Jane Roe', 'Individual'), ('Globex', 'Business');
INSERT INTO sales_orders (order_number, customer_id, warehouse_id, order_date, order_status, payment_status, total_amount) VALUES
    ('SO-1', 1, 1, '2024-05-03', 'Delivered', 'Paid', 1225),
    ('SO-2', 2, 1, '2024-06-11', 'Pending', 'Pending', 2400),
    ('SO-3', 2, 2, '2024-06-20', 'Cancelled', 'Refunded', 40);
INSERT INTO sales_order_items (order_id, product_id, quantity, unit_price, line_total) VALUES
    (1, 1, 1, 1200, 1200),
    (1, 2, 1, 25, 25),
    (2, 1, 2, 1200, 2400),
    (3, 3, 1, 40, 40);
"#;
