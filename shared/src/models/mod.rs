//! Domain models for the Stock Ledger

mod catalog;
mod movement;

pub use catalog::*;
pub use movement::*;

use thiserror::Error;

/// Errors raised while converting raw values into domain models
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown movement type: {0}")]
    UnknownMovementType(String),

    #[error("unknown movement status: {0}")]
    UnknownMovementStatus(String),
}
