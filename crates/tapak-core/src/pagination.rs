//! Pagination utilities for list endpoints.
//!
//! List endpoints are page-based:
//! - `page`: page number (1-indexed, default: 1)
//! - `limit`: items per page (1-100, default: 10)
//!
//! Out-of-range values are clamped rather than rejected, so `?page=0&limit=500`
//! behaves like `?page=1&limit=100`.
//!
//! # Example
//!
//! ```ignore
//! use tapak_core::pagination::{PaginationParams, calculate_pagination};
//!
//! async fn list_projects(
//!     Query(params): Query<PaginationParams>,
//! ) -> Result<ApiResponse<Vec<Project>>, AppError> {
//!     let (page, limit) = params.normalized();
//!     let projects = fetch_projects(limit, params.offset()).await?;
//!     let total = count_projects().await?;
//!
//!     Ok(ApiResponse::paginated("Daftar project", projects, calculate_pagination(page, limit, total)))
//! }
//! ```

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::serde::deserialize_optional_i64;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Pagination block attached to list responses.
///
/// # Example JSON
///
/// ```json
/// {
///   "page": 1,
///   "limit": 10,
///   "total_items": 42,
///   "total_pages": 5,
///   "has_next": true,
///   "has_prev": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Items per page after clamping
    pub limit: i64,
    /// Total number of items across all pages
    pub total_items: i64,
    /// Number of pages (0 when there are no items)
    pub total_pages: i64,
    /// Whether a page after this one exists
    pub has_next: bool,
    /// Whether a page before this one exists
    pub has_prev: bool,
}

/// Query parameters for page-based pagination.
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page, limit }
    }

    /// Effective `(page, limit)` with defaults applied and bounds enforced.
    #[must_use]
    pub fn normalized(&self) -> (i64, i64) {
        normalize_pagination_params(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }

    /// Number of rows to skip for the effective page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        let (page, limit) = self.normalized();
        (page - 1) * limit
    }
}

/// Clamps a non-positive page to 1 and the limit into `[1, MAX_LIMIT]`.
#[must_use]
pub fn normalize_pagination_params(page: i64, limit: i64) -> (i64, i64) {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_LIMIT);
    (page, limit)
}

/// Builds the pagination block for a page of `total_items`.
///
/// Inputs are normalised first, so `calculate_pagination(1, 200, 500)` reports
/// a limit of 100 and 5 pages.
#[must_use]
pub fn calculate_pagination(page: i64, limit: i64, total_items: i64) -> PaginationMeta {
    let (page, limit) = normalize_pagination_params(page, limit);
    let total_items = total_items.max(0);
    let total_pages = (total_items + limit - 1) / limit;

    PaginationMeta {
        page,
        limit,
        total_items,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_pagination_clamps_limit() {
        let meta = calculate_pagination(1, 200, 500);
        assert_eq!(meta.limit, 100);
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_calculate_pagination_partial_last_page() {
        let meta = calculate_pagination(5, 10, 42);
        assert_eq!(meta.total_pages, 5);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_calculate_pagination_no_items() {
        let meta = calculate_pagination(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_calculate_pagination_page_past_end() {
        let meta = calculate_pagination(9, 10, 15);
        assert_eq!(meta.page, 9);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_normalize_non_positive_page() {
        assert_eq!(normalize_pagination_params(0, 10), (1, 10));
        assert_eq!(normalize_pagination_params(-3, 10), (1, 10));
    }

    #[test]
    fn test_normalize_limit_bounds() {
        assert_eq!(normalize_pagination_params(1, 0), (1, 1));
        assert_eq!(normalize_pagination_params(1, -5), (1, 1));
        assert_eq!(normalize_pagination_params(1, 101), (1, 100));
        assert_eq!(normalize_pagination_params(1, 100), (1, 100));
        assert_eq!(normalize_pagination_params(1, 1), (1, 1));
    }

    #[test]
    fn test_params_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.normalized(), (1, 10));
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_params_offset_from_page() {
        let params = PaginationParams::new(Some(3), Some(20));
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_params_offset_uses_clamped_values() {
        let params = PaginationParams::new(Some(0), Some(500));
        assert_eq!(params.normalized(), (1, 100));
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_params_deserialize_strings() {
        let json = r#"{"page":"2","limit":"25"}"#;
        let params: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.normalized(), (2, 25));
        assert_eq!(params.offset(), 25);
    }

    #[test]
    fn test_params_deserialize_empty_strings() {
        let json = r#"{"page":"","limit":""}"#;
        let params: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.normalized(), (1, 10));
    }

    #[test]
    fn test_params_deserialize_missing_fields() {
        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert!(params.page.is_none());
        assert!(params.limit.is_none());
    }

    #[test]
    fn test_params_deserialize_invalid_number() {
        let json = r#"{"page":"abc"}"#;
        assert!(serde_json::from_str::<PaginationParams>(json).is_err());
    }

    #[test]
    fn test_meta_serialize_field_names() {
        let serialized = serde_json::to_string(&calculate_pagination(1, 10, 11)).unwrap();
        assert!(serialized.contains(r#""total_items":11"#));
        assert!(serialized.contains(r#""total_pages":2"#));
        assert!(serialized.contains(r#""has_next":true"#));
        assert!(serialized.contains(r#""has_prev":false"#));
    }
}
