use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::lifecycle::{OrderStatus, ProductStatus, ReturnStatus, SalesChannel};

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self { page, limit }
    }

    /// Returns `(page, limit, offset)` with `offset = (page - 1) * limit`.
    pub fn normalize(&self) -> (u64, u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = (page - 1).saturating_mul(limit);
        (page, limit, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive substring matched against name or category.
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub channel: Option<SalesChannel>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReturnListQuery {
    pub status: Option<ReturnStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ReturnListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

/// Escape LIKE wildcards so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_offset_based_and_clamped() {
        assert_eq!(Pagination::new(None, None).normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(Some(3), Some(10)).normalize(), (3, 10, 20));
        assert_eq!(Pagination::new(Some(0), Some(0)).normalize(), (1, 1, 0));
        assert_eq!(Pagination::new(Some(2), Some(1000)).normalize(), (2, 100, 100));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("jersey"), "%jersey%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
