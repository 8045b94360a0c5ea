//! Composable search predicates over the movement ledger
//!
//! A `MovementFilter` is built once per query and either evaluated against
//! in-memory rows or rendered into a parameterized PostgreSQL `WHERE` clause.
//! Rows are joined to their product, category, supplier and actor with LEFT
//! JOIN semantics: a missing relation never matches on its own fields but
//! never excludes the row either.

use chrono::Datelike;
use shared::{Actor, Category, Movement, Product, Supplier};
use sqlx::{Postgres, QueryBuilder};

/// A searchable text field of a movement or one of its relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Description,
    Note,
    Status,
    MovementType,
    ActorName,
    ActorEmail,
    ActorPhoneNumber,
    SupplierName,
    SupplierContactInfo,
    ProductName,
    ProductSku,
    ProductDescription,
    CategoryName,
}

impl SearchField {
    /// Fields consulted by free-text search, in evaluation order
    pub const FREE_TEXT: [SearchField; 13] = [
        SearchField::Description,
        SearchField::Note,
        SearchField::Status,
        SearchField::MovementType,
        SearchField::ActorName,
        SearchField::ActorEmail,
        SearchField::ActorPhoneNumber,
        SearchField::SupplierName,
        SearchField::SupplierContactInfo,
        SearchField::ProductName,
        SearchField::ProductSku,
        SearchField::ProductDescription,
        SearchField::CategoryName,
    ];

    /// Qualified column in the joined ledger query
    pub fn column(&self) -> &'static str {
        match self {
            SearchField::Description => "t.description",
            SearchField::Note => "t.note",
            SearchField::Status => "t.status",
            SearchField::MovementType => "t.transaction_type",
            SearchField::ActorName => "u.name",
            SearchField::ActorEmail => "u.email",
            SearchField::ActorPhoneNumber => "u.phone_number",
            SearchField::SupplierName => "s.name",
            SearchField::SupplierContactInfo => "s.contact_info",
            SearchField::ProductName => "p.name",
            SearchField::ProductSku => "p.sku",
            SearchField::ProductDescription => "p.description",
            SearchField::CategoryName => "c.name",
        }
    }

    /// Value of this field for a joined row, if the row has one
    pub fn value<'a>(&self, view: &MovementView<'a>) -> Option<&'a str> {
        let movement = view.movement;
        match self {
            SearchField::Description => movement.description.as_deref(),
            SearchField::Note => movement.note.as_deref(),
            SearchField::Status => Some(movement.status.as_str()),
            SearchField::MovementType => Some(movement.movement_type.as_str()),
            SearchField::ActorName => view.actor.map(|a| a.name.as_str()),
            SearchField::ActorEmail => view.actor.map(|a| a.email.as_str()),
            SearchField::ActorPhoneNumber => view.actor.and_then(|a| a.phone_number.as_deref()),
            SearchField::SupplierName => view.supplier.map(|s| s.name.as_str()),
            SearchField::SupplierContactInfo => view.supplier.map(|s| s.contact_info.as_str()),
            SearchField::ProductName => view.product.map(|p| p.name.as_str()),
            SearchField::ProductSku => view.product.map(|p| p.sku.as_str()),
            SearchField::ProductDescription => view.product.and_then(|p| p.description.as_deref()),
            SearchField::CategoryName => view.category.map(|c| c.name.as_str()),
        }
    }
}

/// A movement joined with its (optional) relations
#[derive(Debug, Clone, Copy)]
pub struct MovementView<'a> {
    pub movement: &'a Movement,
    pub product: Option<&'a Product>,
    pub category: Option<&'a Category>,
    pub supplier: Option<&'a Supplier>,
    pub actor: Option<&'a Actor>,
}

impl<'a> MovementView<'a> {
    /// A view with no relations resolved
    pub fn bare(movement: &'a Movement) -> Self {
        Self {
            movement,
            product: None,
            category: None,
            supplier: None,
            actor: None,
        }
    }
}

/// Search predicate over the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementFilter {
    /// Matches every movement
    All,
    /// Case-insensitive substring match of `term` against any of `fields`
    AnyFieldContains {
        term: String,
        fields: Vec<SearchField>,
    },
    /// `created_at` (UTC) falls in the given calendar month of the given year
    CreatedIn { month: u32, year: i32 },
    /// Every inner filter matches
    And(Vec<MovementFilter>),
}

impl MovementFilter {
    /// Free-text search across every searchable field; empty matches all
    pub fn by_free_text(term: &str) -> Self {
        if term.is_empty() {
            return MovementFilter::All;
        }
        MovementFilter::AnyFieldContains {
            term: term.to_string(),
            fields: SearchField::FREE_TEXT.to_vec(),
        }
    }

    /// Month is expected in 1-12; callers validate it
    pub fn by_month_and_year(month: u32, year: i32) -> Self {
        MovementFilter::CreatedIn { month, year }
    }

    pub fn and(self, other: MovementFilter) -> Self {
        match (self, other) {
            (MovementFilter::All, f) | (f, MovementFilter::All) => f,
            (MovementFilter::And(mut left), MovementFilter::And(right)) => {
                left.extend(right);
                MovementFilter::And(left)
            }
            (MovementFilter::And(mut left), f) => {
                left.push(f);
                MovementFilter::And(left)
            }
            (f, other) => MovementFilter::And(vec![f, other]),
        }
    }

    /// Evaluate against an in-memory row
    pub fn matches(&self, view: &MovementView<'_>) -> bool {
        match self {
            MovementFilter::All => true,
            MovementFilter::AnyFieldContains { term, fields } => {
                let needle = term.to_lowercase();
                fields.iter().any(|field| {
                    field
                        .value(view)
                        .is_some_and(|value| value.to_lowercase().contains(&needle))
                })
            }
            MovementFilter::CreatedIn { month, year } => {
                let created = view.movement.created_at;
                created.month() == *month && created.year() == *year
            }
            MovementFilter::And(filters) => filters.iter().all(|f| f.matches(view)),
        }
    }

    /// Render as a boolean SQL expression with bound parameters.
    ///
    /// Column names assume the joined query aliases `t` (transactions),
    /// `u` (users), `s` (suppliers), `p` (products) and `c` (categories).
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            MovementFilter::All => {
                qb.push("TRUE");
            }
            MovementFilter::AnyFieldContains { term, fields } => {
                if fields.is_empty() {
                    qb.push("FALSE");
                    return;
                }
                let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
                qb.push("(");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(format!("LOWER({}) LIKE ", field.column()));
                    qb.push_bind(pattern.clone());
                }
                qb.push(")");
            }
            MovementFilter::CreatedIn { month, year } => {
                qb.push("(EXTRACT(MONTH FROM t.created_at AT TIME ZONE 'UTC')::int = ");
                qb.push_bind(i32::try_from(*month).unwrap_or(i32::MAX));
                qb.push(" AND EXTRACT(YEAR FROM t.created_at AT TIME ZONE 'UTC')::int = ");
                qb.push_bind(*year);
                qb.push(")");
            }
            MovementFilter::And(filters) => {
                if filters.is_empty() {
                    qb.push("TRUE");
                    return;
                }
                qb.push("(");
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        qb.push(" AND ");
                    }
                    filter.push_sql(qb);
                }
                qb.push(")");
            }
        }
    }
}

/// Escape LIKE wildcards so the term matches literally (backslash escape)
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
