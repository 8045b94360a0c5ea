//! Shared fixtures for ledger integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{
    Actor, Category, Movement, MovementRequest, MovementStatus, NewMovement, Page, PageRequest,
    Product, Supplier,
};
use stock_ledger::error::{AppError, AppResult};
use stock_ledger::ledger::{InMemoryLedgerStore, LedgerStore, MovementFilter};

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A seeded in-memory ledger: one actor, one supplier, one product (price 10.00, stock 5)
pub struct Fixture {
    pub store: Arc<InMemoryLedgerStore>,
    pub actor: Actor,
    pub supplier: Supplier,
    pub category: Category,
    pub product: Product,
}

pub fn fixture() -> Fixture {
    let store = Arc::new(InMemoryLedgerStore::new());
    let actor = store
        .insert_actor("Dana Clerk", "dana@shop.example", Some("+1-555-0100"))
        .unwrap();
    let supplier = store
        .insert_supplier("Acme Supplies", "orders@acme.example", Some("1 Warehouse Rd"))
        .unwrap();
    let category = store.insert_category("Beverages").unwrap();
    let product = store
        .insert_product(Product {
            id: 0,
            name: "Cold Brew".to_string(),
            sku: "CB-001".to_string(),
            price: dec("10.00"),
            stock_quantity: 5,
            description: Some("Bottled cold brew coffee".to_string()),
            category_id: Some(category.id),
        })
        .unwrap();

    Fixture {
        store,
        actor,
        supplier,
        category,
        product,
    }
}

impl Fixture {
    pub fn request(&self, quantity: i32, supplier_id: Option<i64>) -> MovementRequest {
        MovementRequest {
            product_id: self.product.id,
            supplier_id,
            quantity,
            description: None,
            note: None,
        }
    }

    pub fn dyn_store(&self) -> Arc<dyn LedgerStore> {
        self.store.clone()
    }

    pub async fn stock(&self) -> i64 {
        self.store
            .get_product(self.product.id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }
}

/// Store whose writes always fail the way an unreachable database would
pub struct FailingStore {
    pub inner: Arc<InMemoryLedgerStore>,
}

fn unavailable() -> AppError {
    AppError::DatabaseError(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl LedgerStore for FailingStore {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn get_supplier(&self, id: i64) -> AppResult<Option<Supplier>> {
        self.inner.get_supplier(id).await
    }

    async fn get_category(&self, id: i64) -> AppResult<Option<Category>> {
        self.inner.get_category(id).await
    }

    async fn get_actor(&self, id: i64) -> AppResult<Option<Actor>> {
        self.inner.get_actor(id).await
    }

    async fn save_product(&self, _product: Product) -> AppResult<Product> {
        Err(unavailable())
    }

    async fn append_movement(&self, _movement: NewMovement) -> AppResult<Movement> {
        Err(unavailable())
    }

    async fn record_movement(
        &self,
        _stock_delta: i64,
        _movement: NewMovement,
    ) -> AppResult<(Product, Movement)> {
        Err(unavailable())
    }

    async fn update_movement_status(
        &self,
        _id: i64,
        _status: MovementStatus,
    ) -> AppResult<Option<Movement>> {
        Err(unavailable())
    }

    async fn find_movement(&self, id: i64) -> AppResult<Option<Movement>> {
        self.inner.find_movement(id).await
    }

    async fn query_movements(
        &self,
        _filter: &MovementFilter,
        _page: PageRequest,
    ) -> AppResult<Page<Movement>> {
        Err(unavailable())
    }

    async fn query_all_movements(&self, _filter: &MovementFilter) -> AppResult<Vec<Movement>> {
        Err(unavailable())
    }
}
