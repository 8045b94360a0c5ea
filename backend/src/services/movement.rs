//! Movement engine: records purchases, sales and returns against product stock
//!
//! Every operation validates its input and resolves its references before
//! touching the store, then hands the stock change and the ledger entry to
//! the store as a single atomic unit.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    require_supplier, validate_quantity, Actor, Category, Movement, MovementRequest, MovementStatus,
    MovementType, NewMovement, Product, Supplier,
};

use crate::error::{AppError, AppResult};
use crate::ledger::LedgerStore;

/// Movement service for recording stock movements and their status
#[derive(Clone)]
pub struct MovementService {
    store: Arc<dyn LedgerStore>,
}

/// Result of a recorded movement: the ledger entry and the product after it
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMovement {
    pub movement: Movement,
    pub product: Product,
}

/// A movement together with the product, category and supplier it references
#[derive(Debug, Clone, Serialize)]
pub struct MovementDetail {
    #[serde(flatten)]
    pub movement: Movement,
    pub product: Option<Product>,
    pub category: Option<Category>,
    pub supplier: Option<Supplier>,
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Record a purchase from a supplier; adds to stock
    pub async fn purchase(
        &self,
        request: MovementRequest,
        actor: &Actor,
    ) -> AppResult<RecordedMovement> {
        self.record(MovementType::Purchase, request, actor).await
    }

    /// Record a sale; removes from stock. Any supplier on the request is ignored.
    pub async fn sell(&self, request: MovementRequest, actor: &Actor) -> AppResult<RecordedMovement> {
        self.record(MovementType::Sale, request, actor).await
    }

    /// Record goods sent back to a supplier; removes from stock and stays
    /// PROCESSING until the supplier confirms.
    pub async fn return_to_supplier(
        &self,
        request: MovementRequest,
        actor: &Actor,
    ) -> AppResult<RecordedMovement> {
        self.record(MovementType::ReturnToSupplier, request, actor).await
    }

    async fn record(
        &self,
        movement_type: MovementType,
        request: MovementRequest,
        actor: &Actor,
    ) -> AppResult<RecordedMovement> {
        let MovementRequest {
            product_id,
            supplier_id,
            quantity,
            description,
            note,
        } = request;

        validate_quantity(quantity).map_err(|msg| AppError::validation("quantity", msg))?;

        let supplier_id = if movement_type.requires_supplier() {
            let id = require_supplier(supplier_id)
                .map_err(|msg| AppError::missing_reference("supplier_id", msg))?;
            Some(id)
        } else {
            None
        };

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))?;

        if let Some(id) = supplier_id {
            self.store
                .get_supplier(id)
                .await?
                .ok_or_else(|| AppError::not_found("Supplier"))?;
        }

        let total_price = movement_type
            .total_price(product.price, quantity)
            .ok_or_else(|| AppError::validation("quantity", "Total price is out of range"))?;

        let movement = NewMovement {
            movement_type,
            status: MovementStatus::initial_for(movement_type),
            quantity,
            total_price,
            description,
            note,
            product_id: product.id,
            actor_id: actor.id,
            supplier_id,
        };

        let (product, movement) = self
            .store
            .record_movement(movement_type.stock_delta(quantity), movement)
            .await?;

        tracing::info!(
            movement_id = movement.id,
            movement_type = %movement.movement_type,
            product_id = product.id,
            actor_id = actor.id,
            quantity,
            stock_quantity = product.stock_quantity,
            "Movement recorded"
        );

        if product.stock_quantity < 0 {
            tracing::warn!(
                product_id = product.id,
                stock_quantity = product.stock_quantity,
                "Stock quantity is negative"
            );
        }

        Ok(RecordedMovement { movement, product })
    }

    /// Get a movement with its product, category and supplier
    pub async fn get_movement(&self, id: i64) -> AppResult<MovementDetail> {
        let movement = self
            .store
            .find_movement(id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction"))?;

        let product = self.store.get_product(movement.product_id).await?;
        let category = match product.as_ref().and_then(|p| p.category_id) {
            Some(category_id) => self.store.get_category(category_id).await?,
            None => None,
        };
        let supplier = match movement.supplier_id {
            Some(supplier_id) => self.store.get_supplier(supplier_id).await?,
            None => None,
        };

        Ok(MovementDetail {
            movement,
            product,
            category,
            supplier,
        })
    }

    /// Replace a movement's status.
    ///
    /// No transition table applies: any status may replace any other,
    /// including re-opening a terminal one.
    pub async fn update_status(&self, id: i64, status: MovementStatus) -> AppResult<Movement> {
        let existing = self
            .store
            .find_movement(id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction"))?;

        if existing.status.is_terminal() && existing.status != status {
            tracing::warn!(
                movement_id = id,
                from = %existing.status,
                to = %status,
                "Replacing terminal movement status"
            );
        }

        let updated = self
            .store
            .update_movement_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction"))?;

        tracing::info!(movement_id = id, status = %updated.status, "Movement status updated");

        Ok(updated)
    }
}
