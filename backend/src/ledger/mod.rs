//! Stock ledger storage
//!
//! Durable record of product stock quantities and the append-only history of
//! movements against them. The `LedgerStore` trait is implemented by a
//! PostgreSQL store for production and an in-memory store for tests and local
//! development.
//!
//! Lookups return `Option`; turning absence into a not-found failure is the
//! caller's job. Implementations never apply business validation.

pub mod filter;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::{
    Actor, Category, Movement, MovementStatus, NewMovement, Page, PageRequest, Product, Supplier,
};

use crate::error::{AppError, AppResult};

pub use filter::{MovementFilter, MovementView, SearchField};
pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>>;

    async fn get_supplier(&self, id: i64) -> AppResult<Option<Supplier>>;

    async fn get_category(&self, id: i64) -> AppResult<Option<Category>>;

    async fn get_actor(&self, id: i64) -> AppResult<Option<Actor>>;

    /// Persist every field of an existing product.
    ///
    /// Fails with not-found when no product has this id.
    async fn save_product(&self, product: Product) -> AppResult<Product>;

    /// Assign identity and `created_at`, then persist.
    async fn append_movement(&self, movement: NewMovement) -> AppResult<Movement>;

    /// Apply `stock_delta` to the movement's product and append the movement
    /// as one atomic unit.
    ///
    /// Concurrent calls against the same product are serialized; either both
    /// writes become visible or neither does.
    async fn record_movement(
        &self,
        stock_delta: i64,
        movement: NewMovement,
    ) -> AppResult<(Product, Movement)>;

    /// Replace the status and stamp `updated_at` with the current time
    async fn update_movement_status(
        &self,
        id: i64,
        status: MovementStatus,
    ) -> AppResult<Option<Movement>>;

    async fn find_movement(&self, id: i64) -> AppResult<Option<Movement>>;

    /// One page of matching movements, newest (highest id) first
    async fn query_movements(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> AppResult<Page<Movement>>;

    /// Every matching movement, newest first
    async fn query_all_movements(&self, filter: &MovementFilter) -> AppResult<Vec<Movement>>;
}

/// New stock quantity after `delta`; out-of-range results are rejected
/// before anything is written.
pub(crate) fn apply_stock_delta(stock_quantity: i64, delta: i64) -> AppResult<i64> {
    stock_quantity
        .checked_add(delta)
        .ok_or_else(|| AppError::validation("quantity", "Stock quantity is out of range"))
}
