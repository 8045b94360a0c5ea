//! Shared types and models for the Stock Ledger
//!
//! This crate contains the domain vocabulary shared between the backend
//! services, the storage layer and API clients.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
