//! `?page=&limit=` parsing and the list envelope.

use std::collections::HashMap;

use serde::Serialize;

use crate::vapi::{ListParams, Page};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Lenient parse: anything unusable falls back to the defaults.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self::with_default_limit(query, DEFAULT_LIMIT)
    }

    pub fn with_default_limit(query: &HashMap<String, String>, default_limit: u32) -> Self {
        let page = query
            .get("page")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PAGE);
        let limit = query
            .get("limit")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .unwrap_or(default_limit);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn list_params(&self) -> ListParams {
        ListParams {
            limit: self.limit,
            offset: self.offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

/// `{ data, pagination }` list envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn from_page(page: Page<T>, request: PageRequest) -> Self {
        Self {
            data: page.data,
            pagination: Pagination {
                page: request.page,
                limit: request.limit,
                total: page.total,
                has_more: page.has_more,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_and_offsets() {
        let request = PageRequest::from_query(&query(&[]));
        assert_eq!(request, PageRequest { page: 1, limit: 20 });
        assert_eq!(request.offset(), 0);

        let request = PageRequest::from_query(&query(&[("page", "3"), ("limit", "10")]));
        assert_eq!(request.offset(), 20);
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let request =
            PageRequest::from_query(&query(&[("page", "0"), ("limit", "500")]));
        assert_eq!(request, PageRequest { page: 1, limit: 20 });

        let request = PageRequest::from_query(&query(&[("page", "-2"), ("limit", "abc")]));
        assert_eq!(request, PageRequest { page: 1, limit: 20 });
    }

    #[test]
    fn custom_default_limit() {
        let request = PageRequest::with_default_limit(&query(&[]), 50);
        assert_eq!(request.limit, 50);
    }
}
