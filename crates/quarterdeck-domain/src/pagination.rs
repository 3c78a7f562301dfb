//! Pagination types shared across list endpoints.

use serde::{Deserialize, Serialize};

/// Pagination parameters as they arrive from the request.
///
/// - `count`: rows per page, default 10
/// - `page`: ≥ 1, default 1
///
/// Malformed numeric parameters coerce to 0 during extraction and are then
/// rejected by [`PageRequest::validated`] rather than clamped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_count() -> u32 {
    10
}

fn default_page() -> u32 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            count: default_count(),
            page: default_page(),
        }
    }
}

/// A zero page number or page size. Returned to the caller, never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid pagination: page and count must be at least 1")]
pub struct InvalidPage;

impl PageRequest {
    /// Reject out-of-range values. `page == 0` or `count == 0` (including
    /// values that failed numeric coercion upstream) is an error.
    pub fn validated(self) -> Result<Self, InvalidPage> {
        if self.page == 0 || self.count == 0 {
            return Err(InvalidPage);
        }
        Ok(self)
    }

    /// Row offset of the first item on this page. Saturates on `page == 0`
    /// so the method cannot underflow even before validation.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.count)
    }
}

/// One page of results together with the total row count of the
/// filtered dataset it was cut from.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub count: u32,
}

impl<T> Page<T> {
    /// Number of pages the dataset spans with this page size.
    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(u64::from(self.count))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            count: self.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_count_10_page_1() {
        let p = PageRequest::default();
        assert_eq!(p.count, 10);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn should_deserialize_defaults_when_fields_absent() {
        let p: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(p.count, 10);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn should_reject_zero_count() {
        assert!(PageRequest { count: 0, page: 1 }.validated().is_err());
    }

    #[test]
    fn should_reject_zero_page() {
        assert!(PageRequest { count: 10, page: 0 }.validated().is_err());
    }

    #[test]
    fn should_accept_in_range_values() {
        let p = PageRequest { count: 50, page: 3 }.validated().unwrap();
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn should_not_underflow_offset_on_zero_page() {
        assert_eq!(PageRequest { count: 10, page: 0 }.offset(), 0);
    }

    #[test]
    fn should_compute_page_count() {
        let page = Page::<u8> {
            items: vec![],
            total: 25,
            page: 1,
            count: 10,
        };
        assert_eq!(page.page_count(), 3);
    }
}
