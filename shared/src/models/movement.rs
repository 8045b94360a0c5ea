//! Stock movement models and the status workflow

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ModelError;

/// Kind of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Purchase,
    Sale,
    ReturnToSupplier,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "PURCHASE",
            MovementType::Sale => "SALE",
            MovementType::ReturnToSupplier => "RETURN_TO_SUPPLIER",
        }
    }

    /// Whether the movement must reference a supplier
    pub fn requires_supplier(&self) -> bool {
        matches!(self, MovementType::Purchase | MovementType::ReturnToSupplier)
    }

    /// Signed change applied to the product's stock quantity
    pub fn stock_delta(&self, quantity: i32) -> i64 {
        let quantity = i64::from(quantity);
        match self {
            MovementType::Purchase => quantity,
            MovementType::Sale | MovementType::ReturnToSupplier => -quantity,
        }
    }

    /// Total recorded at creation time, or `None` when it overflows `Decimal`.
    ///
    /// Returns are valued at zero until the supplier confirms them.
    pub fn total_price(&self, unit_price: Decimal, quantity: i32) -> Option<Decimal> {
        match self {
            MovementType::Purchase | MovementType::Sale => {
                unit_price.checked_mul(Decimal::from(quantity))
            }
            MovementType::ReturnToSupplier => Some(Decimal::ZERO),
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PURCHASE" => Ok(MovementType::Purchase),
            "SALE" => Ok(MovementType::Sale),
            "RETURN_TO_SUPPLIER" => Ok(MovementType::ReturnToSupplier),
            other => Err(ModelError::UnknownMovementType(other.to_string())),
        }
    }
}

/// Completion status of a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl MovementStatus {
    pub const ALL: [MovementStatus; 4] = [
        MovementStatus::Pending,
        MovementStatus::Processing,
        MovementStatus::Completed,
        MovementStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementStatus::Pending => "PENDING",
            MovementStatus::Processing => "PROCESSING",
            MovementStatus::Completed => "COMPLETED",
            MovementStatus::Cancelled => "CANCELLED",
        }
    }

    /// Status a freshly recorded movement starts in.
    ///
    /// Purchases and sales take effect immediately; a return waits for the
    /// supplier to confirm it.
    pub fn initial_for(movement_type: MovementType) -> Self {
        match movement_type {
            MovementType::Purchase | MovementType::Sale => MovementStatus::Completed,
            MovementType::ReturnToSupplier => MovementStatus::Processing,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MovementStatus::Completed | MovementStatus::Cancelled)
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(MovementStatus::Pending),
            "PROCESSING" => Ok(MovementStatus::Processing),
            "COMPLETED" => Ok(MovementStatus::Completed),
            "CANCELLED" => Ok(MovementStatus::Cancelled),
            other => Err(ModelError::UnknownMovementStatus(other.to_string())),
        }
    }
}

/// A recorded stock movement (ledger entry)
///
/// Only `status` and `updated_at` change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub id: i64,
    pub movement_type: MovementType,
    pub status: MovementStatus,
    pub quantity: i32,
    pub total_price: Decimal,
    pub description: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub product_id: i64,
    pub actor_id: i64,
    /// Always `None` for sales
    pub supplier_id: Option<i64>,
}

/// A movement ready to be appended to the ledger (no identity yet)
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub status: MovementStatus,
    pub quantity: i32,
    pub total_price: Decimal,
    pub description: Option<String>,
    pub note: Option<String>,
    pub product_id: i64,
    pub actor_id: i64,
    pub supplier_id: Option<i64>,
}

impl NewMovement {
    /// Stamp identity and creation time onto the pending movement
    pub fn into_movement(self, id: i64, created_at: DateTime<Utc>) -> Movement {
        Movement {
            id,
            movement_type: self.movement_type,
            status: self.status,
            quantity: self.quantity,
            total_price: self.total_price,
            description: self.description,
            note: self.note,
            created_at,
            updated_at: None,
            product_id: self.product_id,
            actor_id: self.actor_id,
            supplier_id: self.supplier_id,
        }
    }
}

/// Request to record a purchase, sale or return
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MovementRequest {
    pub product_id: i64,
    pub supplier_id: Option<i64>,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Request to replace a movement's status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: MovementStatus,
}
