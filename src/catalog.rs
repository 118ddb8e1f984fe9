//! Schema catalog for the inventory & sales database.
//!
//! Pure data: the table list the language model is grounded on.

use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub name: &'static str,
    pub primary_key: Vec<&'static str>,
    pub columns: Vec<&'static str>,
    /// (column, referenced table)
    pub foreign_keys: Vec<(&'static str, &'static str)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaCatalog {
    tables: Vec<TableInfo>,
    usage_hints: Vec<&'static str>,
}

impl SchemaCatalog {
    /// The fixed inventory/sales schema.
    pub fn inventory_sales() -> Self {
        let tables = vec![
            TableInfo {
                name: "categories",
                primary_key: vec!["category_id"],
                columns: vec!["category_id", "category_name", "description"],
                foreign_keys: vec![],
            },
            TableInfo {
                name: "suppliers",
                primary_key: vec!["supplier_id"],
                columns: vec![
                    "supplier_id", "supplier_name", "contact_person", "email", "phone",
                    "address", "city", "country",
                ],
                foreign_keys: vec![],
            },
            TableInfo {
                name: "products",
                primary_key: vec!["product_id"],
                columns: vec![
                    "product_id", "product_name", "product_code", "category_id", "supplier_id",
                    "unit_price", "cost_price", "weight", "dimensions", "is_active",
                ],
                foreign_keys: vec![("category_id", "categories"), ("supplier_id", "suppliers")],
            },
            TableInfo {
                name: "warehouses",
                primary_key: vec!["warehouse_id"],
                columns: vec![
                    "warehouse_id", "warehouse_name", "location", "capacity", "manager_name",
                    "phone",
                ],
                foreign_keys: vec![],
            },
            TableInfo {
                name: "inventory",
                primary_key: vec!["inventory_id"],
                columns: vec![
                    "inventory_id", "product_id", "warehouse_id", "quantity_on_hand", "quantity_reserved",
                    "reorder_level", "max_stock_level",
                ],
                foreign_keys: vec![("product_id", "products"), ("warehouse_id", "warehouses")],
            },
            TableInfo {
                name: "customers",
                primary_key: vec!["customer_id"],
                columns: vec![
                    "customer_id", "customer_name", "customer_type", "email", "phone", "address",
                    "city", "country", "credit_limit",
                ],
                foreign_keys: vec![],
            },
            TableInfo {
                name: "sales_orders",
                primary_key: vec!["order_id"],
                columns: vec![
                    "order_id", "order_number", "customer_id", "warehouse_id", "order_date",
                    "required_date", "shipped_date", "order_status", "payment_status", "subtotal",
                    "tax_amount", "shipping_cost", "total_amount",
                ],
                foreign_keys: vec![("customer_id", "customers"), ("warehouse_id", "warehouses")],
            },
            TableInfo {
                name: "sales_order_items",
                primary_key: vec!["order_item_id"],
                columns: vec![
                    "order_item_id", "order_id", "product_id", "quantity", "unit_price",
                    "discount_percentage", "line_total",
                ],
                foreign_keys: vec![("order_id", "sales_orders"), ("product_id", "products")],
            },
            TableInfo {
                name: "inventory_movements",
                primary_key: vec!["movement_id"],
                columns: vec![
                    "movement_id", "product_id", "warehouse_id", "movement_type", "quantity",
                    "movement_date", "reference_type",
                ],
                foreign_keys: vec![("product_id", "products"), ("warehouse_id", "warehouses")],
            },
        ];

        let usage_hints = vec![
            "customer_type is 'Individual' or 'Business'",
            "order_status is one of Pending, Processing, Shipped, Delivered, Cancelled",
            "payment_status is one of Pending, Paid, Partial, Refunded",
            "movement_type is one of IN, OUT, TRANSFER, ADJUSTMENT",
            "Revenue analysis: use sales_orders and sales_order_items",
            "Inventory levels: use the inventory table",
            "Product performance: join products with sales_order_items",
            "Customer analysis: use customers and sales_orders",
            "Warehouse operations: use warehouses, inventory, sales_orders",
        ];

        Self { tables, usage_hints }
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Render the catalog as prompt context.
    pub fn render(&self) -> String {
        let mut out = String::from("DATABASE SCHEMA INFORMATION:\n\nTABLES AND RELATIONSHIPS:\n");
        for (i, table) in self.tables.iter().enumerate() {
            let _ = writeln!(out, "\n{}. {}", i + 1, table.name);
            let _ = writeln!(out, "   - PRIMARY KEY ({})", table.primary_key.join(", "));
            let _ = writeln!(out, "   - columns: {}", table.columns.join(", "));
            for (column, target) in &table.foreign_keys {
                let _ = writeln!(out, "   - {} (FOREIGN KEY -> {})", column, target);
            }
        }
        out.push_str("\nCOMMON BUSINESS QUERIES:\n");
        for hint in &self.usage_hints {
            let _ = writeln!(out, "- {}", hint);
        }
        out
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::inventory_sales()
    }
}
