//! Catalog, supplier and actor models referenced by the ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product whose stock is tracked by the ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    /// Signed: sales and returns are allowed to drive it below zero
    pub stock_quantity: i64,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A supplier that goods are purchased from or returned to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_info: String,
    pub address: Option<String>,
}

/// The user performing a movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
}
