//! Business logic services for the Stock Ledger

pub mod movement;
pub mod search;

pub use movement::{MovementDetail, MovementService, RecordedMovement};
pub use search::SearchService;
