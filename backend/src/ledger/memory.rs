//! In-memory ledger store
//!
//! Intended for tests and local development. Every write takes a single lock,
//! which gives the same all-or-nothing behaviour as a database transaction.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    Actor, Category, Movement, MovementStatus, NewMovement, Page, PageRequest, Product, Supplier,
};

use super::filter::{MovementFilter, MovementView};
use super::{apply_stock_delta, LedgerStore};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct LedgerState {
    products: BTreeMap<i64, Product>,
    categories: BTreeMap<i64, Category>,
    suppliers: BTreeMap<i64, Supplier>,
    actors: BTreeMap<i64, Actor>,
    /// Append-only, ascending by id
    movements: Vec<Movement>,
    next_id: i64,
}

impl LedgerState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn view<'a>(&'a self, movement: &'a Movement) -> MovementView<'a> {
        let product = self.products.get(&movement.product_id);
        MovementView {
            movement,
            product,
            category: product
                .and_then(|p| p.category_id)
                .and_then(|id| self.categories.get(&id)),
            supplier: movement.supplier_id.and_then(|id| self.suppliers.get(&id)),
            actor: self.actors.get(&movement.actor_id),
        }
    }

    /// Matching movements, newest first
    fn matching<'a>(&'a self, filter: &'a MovementFilter) -> impl Iterator<Item = &'a Movement> {
        self.movements
            .iter()
            .rev()
            .filter(move |m| filter.matches(&self.view(m)))
    }

    fn append(&mut self, movement: NewMovement) -> Movement {
        let id = self.next_id();
        let movement = movement.into_movement(id, Utc::now());
        self.movements.push(movement.clone());
        movement
    }
}

/// In-memory implementation of [`LedgerStore`]
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| AppError::Internal("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| AppError::Internal("ledger lock poisoned".to_string()))
    }

    pub fn insert_category(&self, name: &str) -> AppResult<Category> {
        let mut state = self.write()?;
        let category = Category {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub fn insert_supplier(
        &self,
        name: &str,
        contact_info: &str,
        address: Option<&str>,
    ) -> AppResult<Supplier> {
        let mut state = self.write()?;
        let supplier = Supplier {
            id: state.next_id(),
            name: name.to_string(),
            contact_info: contact_info.to_string(),
            address: address.map(str::to_string),
        };
        state.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    pub fn insert_actor(&self, name: &str, email: &str, phone_number: Option<&str>) -> AppResult<Actor> {
        let mut state = self.write()?;
        let actor = Actor {
            id: state.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            phone_number: phone_number.map(str::to_string),
        };
        state.actors.insert(actor.id, actor.clone());
        Ok(actor)
    }

    /// Register a product; the id field of `product` is ignored
    pub fn insert_product(&self, product: Product) -> AppResult<Product> {
        let mut state = self.write()?;
        let product = Product {
            id: state.next_id(),
            ..product
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn movement_count(&self) -> AppResult<usize> {
        Ok(self.read()?.movements.len())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn get_supplier(&self, id: i64) -> AppResult<Option<Supplier>> {
        Ok(self.read()?.suppliers.get(&id).cloned())
    }

    async fn get_category(&self, id: i64) -> AppResult<Option<Category>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn get_actor(&self, id: i64) -> AppResult<Option<Actor>> {
        Ok(self.read()?.actors.get(&id).cloned())
    }

    async fn save_product(&self, product: Product) -> AppResult<Product> {
        let mut state = self.write()?;
        match state.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(product)
            }
            None => Err(AppError::not_found("Product")),
        }
    }

    async fn append_movement(&self, movement: NewMovement) -> AppResult<Movement> {
        Ok(self.write()?.append(movement))
    }

    async fn record_movement(
        &self,
        stock_delta: i64,
        movement: NewMovement,
    ) -> AppResult<(Product, Movement)> {
        let mut state = self.write()?;

        let product = state
            .products
            .get_mut(&movement.product_id)
            .ok_or_else(|| AppError::not_found("Product"))?;
        product.stock_quantity = apply_stock_delta(product.stock_quantity, stock_delta)?;
        let product = product.clone();

        let movement = state.append(movement);
        Ok((product, movement))
    }

    async fn update_movement_status(
        &self,
        id: i64,
        status: MovementStatus,
    ) -> AppResult<Option<Movement>> {
        let mut state = self.write()?;
        let Some(movement) = state.movements.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        movement.status = status;
        movement.updated_at = Some(Utc::now());
        Ok(Some(movement.clone()))
    }

    async fn find_movement(&self, id: i64) -> AppResult<Option<Movement>> {
        Ok(self.read()?.movements.iter().find(|m| m.id == id).cloned())
    }

    async fn query_movements(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> AppResult<Page<Movement>> {
        let state = self.read()?;
        let total = state.matching(filter).count() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = state
            .matching(filter)
            .skip(offset)
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn query_all_movements(&self, filter: &MovementFilter) -> AppResult<Vec<Movement>> {
        let state = self.read()?;
        Ok(state.matching(filter).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::MovementType;

    fn seeded() -> (InMemoryLedgerStore, Product, Actor) {
        let store = InMemoryLedgerStore::new();
        let actor = store.insert_actor("Sam", "sam@shop.example", None).unwrap();
        let product = store
            .insert_product(Product {
                id: 0,
                name: "Tea".to_string(),
                sku: "TEA-1".to_string(),
                price: Decimal::new(450, 2),
                stock_quantity: 10,
                description: None,
                category_id: None,
            })
            .unwrap();
        (store, product, actor)
    }

    fn sale(product: &Product, actor: &Actor) -> NewMovement {
        NewMovement {
            movement_type: MovementType::Sale,
            status: MovementStatus::Completed,
            quantity: 1,
            total_price: product.price,
            description: None,
            note: None,
            product_id: product.id,
            actor_id: actor.id,
            supplier_id: None,
        }
    }

    #[tokio::test]
    async fn test_save_product_requires_existing() {
        let (store, product, _) = seeded();

        let saved = store
            .save_product(Product {
                stock_quantity: 42,
                ..product.clone()
            })
            .await
            .unwrap();
        assert_eq!(saved.stock_quantity, 42);
        assert_eq!(store.get_product(product.id).await.unwrap(), Some(saved));

        let err = store
            .save_product(Product {
                id: 9_999,
                ..product
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        let (store, product, actor) = seeded();

        let first = store.append_movement(sale(&product, &actor)).await.unwrap();
        let second = store.append_movement(sale(&product, &actor)).await.unwrap();

        assert!(second.id > first.id);
        assert!(second.created_at >= first.created_at);
        assert_eq!(store.movement_count().unwrap(), 2);
        // Appending alone never touches stock
        assert_eq!(
            store.get_product(product.id).await.unwrap().map(|p| p.stock_quantity),
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_record_movement_unknown_product_writes_nothing() {
        let (store, product, actor) = seeded();
        let mut movement = sale(&product, &actor);
        movement.product_id = 9_999;

        let err = store.record_movement(-1, movement).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.movement_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_movement_stock_overflow_writes_nothing() {
        let (store, product, actor) = seeded();
        let product = store
            .save_product(Product {
                stock_quantity: i64::MAX,
                ..product
            })
            .await
            .unwrap();

        let err = store
            .record_movement(1, sale(&product, &actor))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantity"));
        assert_eq!(store.movement_count().unwrap(), 0);

        // The lock is still healthy and the stock untouched
        let after = store.record_movement(-1, sale(&product, &actor)).await.unwrap();
        assert_eq!(after.0.stock_quantity, i64::MAX - 1);
    }

    #[tokio::test]
    async fn test_lookups_return_none_when_absent() {
        let store = InMemoryLedgerStore::new();
        let category = store.insert_category("Snacks").unwrap();

        assert_eq!(store.get_category(category.id).await.unwrap(), Some(category));
        assert!(store.get_category(9_999).await.unwrap().is_none());
        assert!(store.get_supplier(1).await.unwrap().is_none());
        assert!(store.get_actor(1).await.unwrap().is_none());
        assert!(store.find_movement(1).await.unwrap().is_none());
        assert!(store
            .update_movement_status(1, MovementStatus::Cancelled)
            .await
            .unwrap()
            .is_none());
    }
}
