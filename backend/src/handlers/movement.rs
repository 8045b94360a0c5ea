//! HTTP handlers for stock movement endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Movement, MovementRequest, Page, StatusUpdateRequest};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::{MovementDetail, MovementService, RecordedMovement, SearchService};
use crate::AppState;

/// Response envelope for ledger endpoints
#[derive(Debug, Serialize)]
pub struct LedgerResponse<T> {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Movement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl<T> LedgerResponse<T> {
    fn ok(message: &str) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.to_string(),
            transaction: None,
            transactions: None,
            total_elements: None,
            total_pages: None,
            timestamp: Utc::now(),
        }
    }

    fn with_transaction(mut self, transaction: T) -> Self {
        self.transaction = Some(transaction);
        self
    }
}

impl LedgerResponse<Movement> {
    fn with_page(mut self, page: Page<Movement>) -> Self {
        self.total_elements = Some(page.total_elements);
        self.total_pages = Some(page.total_pages);
        self.transactions = Some(page.items);
        self
    }

    fn with_transactions(mut self, transactions: Vec<Movement>) -> Self {
        self.transactions = Some(transactions);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: u32,
    pub size: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MonthYearQuery {
    pub month: u32,
    pub year: i32,
    pub format: Option<String>, // "json" or "csv"
}

fn recorded(message: &str, result: RecordedMovement) -> Json<LedgerResponse<Movement>> {
    Json(LedgerResponse::ok(message).with_transaction(result.movement))
}

/// Record a purchase from a supplier
pub async fn purchase(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<MovementRequest>,
) -> AppResult<Json<LedgerResponse<Movement>>> {
    input.validate()?;
    let service = MovementService::new(state.store);
    let result = service.purchase(input, &actor).await?;
    Ok(recorded("Purchase Made Successfully", result))
}

/// Record a sale to a customer
pub async fn sell(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<MovementRequest>,
) -> AppResult<Json<LedgerResponse<Movement>>> {
    input.validate()?;
    let service = MovementService::new(state.store);
    let result = service.sell(input, &actor).await?;
    Ok(recorded("Product Sale Made Successfully", result))
}

/// Record a return to a supplier
pub async fn return_to_supplier(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<MovementRequest>,
) -> AppResult<Json<LedgerResponse<Movement>>> {
    input.validate()?;
    let service = MovementService::new(state.store);
    let result = service.return_to_supplier(input, &actor).await?;
    Ok(recorded("Product Returned In Progress", result))
}

/// List movements, optionally filtered by a free-text search
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<LedgerResponse<Movement>>> {
    let service = SearchService::new(state.store, state.config.ledger.default_page_size);
    let page = service
        .list_movements(query.search.as_deref(), query.page, query.size)
        .await?;
    Ok(Json(
        LedgerResponse::<Movement>::ok("Transactions Retrieved Successfully").with_page(page),
    ))
}

/// Get a movement with its product and supplier
pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<LedgerResponse<MovementDetail>>> {
    let service = MovementService::new(state.store);
    let detail = service.get_movement(id).await?;
    Ok(Json(
        LedgerResponse::ok("Transaction Retrieved Successfully").with_transaction(detail),
    ))
}

/// Replace a movement's status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<StatusUpdateRequest>,
) -> AppResult<Json<LedgerResponse<Movement>>> {
    let service = MovementService::new(state.store);
    let movement = service.update_status(id, input.status).await?;
    Ok(Json(
        LedgerResponse::ok("Transaction Status Updated Successfully").with_transaction(movement),
    ))
}

/// Movements created in a calendar month, as JSON or CSV
pub async fn movements_by_month(
    State(state): State<AppState>,
    Query(query): Query<MonthYearQuery>,
) -> AppResult<Response> {
    let service = SearchService::new(state.store, state.config.ledger.default_page_size);

    if query.format.as_deref() == Some("csv") {
        let csv = service.export_month_csv(query.month, query.year).await?;
        let disposition = format!(
            "attachment; filename=\"transactions_{}_{:02}.csv\"",
            query.year, query.month
        );
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response());
    }

    let movements = service.movements_by_month(query.month, query.year).await?;
    Ok(Json(
        LedgerResponse::<Movement>::ok("Transactions Retrieved Successfully")
            .with_transactions(movements),
    )
    .into_response())
}
