//! Ledger search and reporting service
//! Provides free-text paginated listing and the month/year movement report

use std::sync::Arc;

use serde::Serialize;
use shared::{validate_month, validate_page_size, Movement, Page, PageRequest};

use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerStore, MovementFilter};

/// Column order of a serialized `Movement`
pub const MOVEMENT_CSV_HEADERS: [&str; 12] = [
    "id",
    "movement_type",
    "status",
    "quantity",
    "total_price",
    "description",
    "note",
    "created_at",
    "updated_at",
    "product_id",
    "actor_id",
    "supplier_id",
];

/// Search service
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn LedgerStore>,
    default_page_size: u32,
}

impl SearchService {
    pub fn new(store: Arc<dyn LedgerStore>, default_page_size: u32) -> Self {
        Self {
            store,
            default_page_size,
        }
    }

    /// List movements matching a free-text search, newest first.
    ///
    /// `page` is zero-based; `size` falls back to the configured default.
    pub async fn list_movements(
        &self,
        search: Option<&str>,
        page: u32,
        size: Option<u32>,
    ) -> AppResult<Page<Movement>> {
        let size = size.unwrap_or(self.default_page_size);
        validate_page_size(size).map_err(|msg| AppError::validation("size", msg))?;

        let filter = MovementFilter::by_free_text(search.unwrap_or_default());
        tracing::debug!(?filter, page, size, "Listing movements");

        self.store
            .query_movements(&filter, PageRequest::new(page, size))
            .await
    }

    /// All movements created in the given calendar month (1-12) of `year`
    pub async fn movements_by_month(&self, month: u32, year: i32) -> AppResult<Vec<Movement>> {
        validate_month(month).map_err(|msg| AppError::validation("month", msg))?;

        let filter = MovementFilter::by_month_and_year(month, year);
        self.store.query_all_movements(&filter).await
    }

    /// Month/year report rendered as CSV; an empty month yields the header only
    pub async fn export_month_csv(&self, month: u32, year: i32) -> AppResult<String> {
        let movements = self.movements_by_month(month, year).await?;
        Self::export_to_csv(&MOVEMENT_CSV_HEADERS, &movements)
    }

    /// Export report data as CSV under an explicit header row.
    ///
    /// `headers` must follow the field order of `T`.
    pub fn export_to_csv<T: Serialize>(headers: &[&str], data: &[T]) -> AppResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        wtr.write_record(headers)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
