//! PostgreSQL ledger store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    Actor, Category, Movement, MovementStatus, NewMovement, Page, PageRequest, Product, Supplier,
};
use sqlx::{Executor, FromRow, PgPool, Postgres, QueryBuilder};

use super::filter::MovementFilter;
use super::{apply_stock_delta, LedgerStore};
use crate::error::{AppError, AppResult};

const PRODUCT_COLUMNS: &str = "id, name, sku, price, stock_quantity, description, category_id";

const MOVEMENT_COLUMNS: &str = "t.id, t.transaction_type, t.status, t.quantity, t.total_price, \
     t.description, t.note, t.created_at, t.updated_at, t.product_id, t.user_id, t.supplier_id";

/// Movements LEFT JOINed with every relation the search filter can inspect
const JOINED_LEDGER: &str = r#"
    FROM transactions t
    LEFT JOIN users u ON u.id = t.user_id
    LEFT JOIN suppliers s ON s.id = t.supplier_id
    LEFT JOIN products p ON p.id = t.product_id
    LEFT JOIN categories c ON c.id = p.category_id
    WHERE "#;

/// PostgreSQL implementation of [`LedgerStore`]
#[derive(Clone)]
pub struct PgLedgerStore {
    db: PgPool,
}

/// Row for product queries
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    sku: String,
    price: Decimal,
    stock_quantity: i64,
    description: Option<String>,
    category_id: Option<i64>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            sku: row.sku,
            price: row.price,
            stock_quantity: row.stock_quantity,
            description: row.description,
            category_id: row.category_id,
        }
    }
}

/// Row for movement queries; enum columns are stored as text
#[derive(Debug, FromRow)]
struct MovementRow {
    id: i64,
    transaction_type: String,
    status: String,
    quantity: i32,
    total_price: Decimal,
    description: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    product_id: i64,
    user_id: i64,
    supplier_id: Option<i64>,
}

impl TryFrom<MovementRow> for Movement {
    type Error = shared::ModelError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(Movement {
            id: row.id,
            movement_type: row.transaction_type.parse()?,
            status: row.status.parse()?,
            quantity: row.quantity,
            total_price: row.total_price,
            description: row.description,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
            product_id: row.product_id,
            actor_id: row.user_id,
            supplier_id: row.supplier_id,
        })
    }
}

fn into_movements(rows: Vec<MovementRow>) -> AppResult<Vec<Movement>> {
    rows.into_iter()
        .map(|row| Movement::try_from(row).map_err(AppError::from))
        .collect()
}

async fn update_product<'e, E>(executor: E, product: &Product) -> AppResult<Option<Product>>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        r#"
        UPDATE products
        SET name = $1, sku = $2, price = $3, stock_quantity = $4, description = $5,
            category_id = $6, updated_at = NOW()
        WHERE id = $7
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(&product.name)
    .bind(&product.sku)
    .bind(product.price)
    .bind(product.stock_quantity)
    .bind(&product.description)
    .bind(product.category_id)
    .bind(product.id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Product::from))
}

async fn insert_movement<'e, E>(executor: E, movement: &NewMovement) -> AppResult<Movement>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query_as::<_, MovementRow>(
        r#"
        INSERT INTO transactions (
            transaction_type, status, quantity, total_price, description, note,
            product_id, user_id, supplier_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, transaction_type, status, quantity, total_price, description, note,
                  created_at, updated_at, product_id, user_id, supplier_id
        "#,
    )
    .bind(movement.movement_type.as_str())
    .bind(movement.status.as_str())
    .bind(movement.quantity)
    .bind(movement.total_price)
    .bind(&movement.description)
    .bind(&movement.note)
    .bind(movement.product_id)
    .bind(movement.actor_id)
    .bind(movement.supplier_id)
    .fetch_one(executor)
    .await?;

    Ok(Movement::try_from(row)?)
}

impl PgLedgerStore {
    /// Create a new PgLedgerStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn select_movements(filter: &MovementFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {MOVEMENT_COLUMNS} {JOINED_LEDGER}"));
        filter.push_sql(&mut qb);
        qb.push(" ORDER BY t.id DESC");
        qb
    }

    fn select_movement_page(
        filter: &MovementFilter,
        page: PageRequest,
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = Self::select_movements(filter);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.size));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        qb
    }

    fn count_movements(filter: &MovementFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) {JOINED_LEDGER}"));
        filter.push_sql(&mut qb);
        qb
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn get_supplier(&self, id: i64) -> AppResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, (i64, String, String, Option<String>)>(
            "SELECT id, name, contact_info, address FROM suppliers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, name, contact_info, address)| Supplier {
            id,
            name,
            contact_info,
            address,
        }))
    }

    async fn get_category(&self, id: i64) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|(id, name)| Category { id, name }))
    }

    async fn get_actor(&self, id: i64) -> AppResult<Option<Actor>> {
        let row = sqlx::query_as::<_, (i64, String, String, Option<String>)>(
            "SELECT id, name, email, phone_number FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, name, email, phone_number)| Actor {
            id,
            name,
            email,
            phone_number,
        }))
    }

    async fn save_product(&self, product: Product) -> AppResult<Product> {
        update_product(&self.db, &product)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }

    async fn append_movement(&self, movement: NewMovement) -> AppResult<Movement> {
        insert_movement(&self.db, &movement).await
    }

    async fn record_movement(
        &self,
        stock_delta: i64,
        movement: NewMovement,
    ) -> AppResult<(Product, Movement)> {
        // Start transaction
        let mut tx = self.db.begin().await?;

        // Lock the product row so concurrent movements on it serialize here
        let mut product: Product = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(movement.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?
        .into();

        // Dropping `tx` on error rolls back and releases the row lock
        product.stock_quantity = apply_stock_delta(product.stock_quantity, stock_delta)?;

        let product = update_product(&mut *tx, &product)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))?;
        let movement = insert_movement(&mut *tx, &movement).await?;

        tx.commit().await?;

        Ok((product, movement))
    }

    async fn update_movement_status(
        &self,
        id: i64,
        status: MovementStatus,
    ) -> AppResult<Option<Movement>> {
        let row = sqlx::query_as::<_, MovementRow>(
            r#"
            UPDATE transactions
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, transaction_type, status, quantity, total_price, description, note,
                      created_at, updated_at, product_id, user_id, supplier_id
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Movement::try_from).transpose()?)
    }

    async fn find_movement(&self, id: i64) -> AppResult<Option<Movement>> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM transactions t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Movement::try_from).transpose()?)
    }

    async fn query_movements(
        &self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> AppResult<Page<Movement>> {
        let mut count = Self::count_movements(filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut select = Self::select_movement_page(filter, page);
        let rows: Vec<MovementRow> = select.build_query_as().fetch_all(&self.db).await?;
        let items = into_movements(rows)?;

        Ok(Page::new(items, u64::try_from(total).unwrap_or(0), page))
    }

    async fn query_all_movements(&self, filter: &MovementFilter) -> AppResult<Vec<Movement>> {
        let mut select = Self::select_movements(filter);
        let rows: Vec<MovementRow> = select.build_query_as().fetch_all(&self.db).await?;
        into_movements(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collapse runs of whitespace so assertions ignore query layout
    fn normalized(qb: &QueryBuilder<'_, Postgres>) -> String {
        qb.sql().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_select_left_joins_every_relation() {
        let sql = normalized(&PgLedgerStore::select_movements(&MovementFilter::All));

        assert!(sql.starts_with("SELECT t.id, t.transaction_type, t.status"));
        assert!(sql.contains("FROM transactions t"));
        assert!(sql.contains("LEFT JOIN users u ON u.id = t.user_id"));
        assert!(sql.contains("LEFT JOIN suppliers s ON s.id = t.supplier_id"));
        assert!(sql.contains("LEFT JOIN products p ON p.id = t.product_id"));
        assert!(sql.contains("LEFT JOIN categories c ON c.id = p.category_id"));
        assert!(!sql.contains("INNER JOIN"));
        assert!(sql.ends_with("WHERE TRUE ORDER BY t.id DESC"));
    }

    #[test]
    fn test_free_text_page_binds_limit_after_search_terms() {
        let filter = MovementFilter::by_free_text("acme");
        let sql = normalized(&PgLedgerStore::select_movement_page(
            &filter,
            PageRequest::new(2, 25),
        ));

        assert!(sql.contains("LOWER(s.contact_info) LIKE $9"));
        assert!(sql.contains("LOWER(c.name) LIKE $13"));
        assert!(sql.ends_with("ORDER BY t.id DESC LIMIT $14 OFFSET $15"));
    }

    #[test]
    fn test_count_shares_joins_and_filter_without_paging() {
        let filter = MovementFilter::by_free_text("acme");
        let sql = normalized(&PgLedgerStore::count_movements(&filter));

        assert!(sql.starts_with("SELECT COUNT(*) FROM transactions t"));
        assert_eq!(sql.matches("LEFT JOIN").count(), 4);
        assert!(sql.contains("LOWER(t.description) LIKE $1"));
        assert!(!sql.contains("ORDER BY"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_month_report_query() {
        let filter = MovementFilter::by_month_and_year(6, 2024);
        let sql = normalized(&PgLedgerStore::select_movements(&filter));

        assert!(sql.contains("EXTRACT(MONTH FROM t.created_at AT TIME ZONE 'UTC')::int = $1"));
        assert!(sql.contains("EXTRACT(YEAR FROM t.created_at AT TIME ZONE 'UTC')::int = $2"));
        assert!(sql.ends_with("ORDER BY t.id DESC"));
    }

    #[test]
    fn test_schema_accepts_every_modelled_amount() {
        let schema = include_str!("../../migrations/20240101000001_create_ledger_tables.sql");
        let schema = schema.split_whitespace().collect::<Vec<_>>().join(" ");

        // Free products are allowed; price times any i32 quantity must fit
        assert!(schema.contains("price NUMERIC(12, 2) NOT NULL CHECK (price >= 0)"));
        assert!(schema.contains("total_price NUMERIC NOT NULL,"));
        assert!(schema.contains("stock_quantity BIGINT NOT NULL"));
    }
}
