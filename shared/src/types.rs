//! Common types used across the ledger

use serde::{Deserialize, Serialize};

/// Pagination parameters (zero-based page index)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

/// One page of results plus totals across all pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_elements: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_elements,
            total_pages: total_pages(total_elements, request.size),
        }
    }
}

/// Number of pages needed to hold `total` items
pub fn total_pages(total: u64, size: u32) -> u32 {
    if size == 0 {
        return 0;
    }
    let size = u64::from(size);
    u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(3, 1), 3);
        assert_eq!(total_pages(10, 3), 4);
        assert_eq!(total_pages(9, 3), 3);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(0, 25).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 75);
    }
}
