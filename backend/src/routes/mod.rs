//! Route definitions for the Stock Ledger

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - stock movements
        .nest("/transactions", transaction_routes(state))
}

/// Stock movement routes (protected)
fn transaction_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_movements))
        .route("/purchase", post(handlers::purchase))
        .route("/sell", post(handlers::sell))
        .route("/return", post(handlers::return_to_supplier))
        .route("/by-month-year", get(handlers::movements_by_month))
        .route("/:id", get(handlers::get_movement))
        .route("/:id/status", put(handlers::update_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
