//! HTTP request handlers

pub mod health;
pub mod movement;

pub use health::health_check;
pub use movement::{
    get_movement, list_movements, movements_by_month, purchase, return_to_supplier, sell,
    update_status,
};
