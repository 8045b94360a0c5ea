//! Validation utilities for ledger input

// ============================================================================
// Movement Validations
// ============================================================================

/// Validate that a movement quantity is a positive number of units
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

/// Validate that a supplier reference is present when the movement needs one
pub fn require_supplier(supplier_id: Option<i64>) -> Result<i64, &'static str> {
    supplier_id.ok_or("Supplier id is required")
}

// ============================================================================
// Query Validations
// ============================================================================

/// Validate calendar month (1-12)
pub fn validate_month(month: u32) -> Result<(), &'static str> {
    if !(1..=12).contains(&month) {
        return Err("Month must be between 1 and 12");
    }
    Ok(())
}

/// Validate page size for paginated listings
pub fn validate_page_size(size: u32) -> Result<(), &'static str> {
    if size == 0 {
        return Err("Page size must be at least 1");
    }
    Ok(())
}
