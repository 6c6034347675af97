//! Pagination extractor.
//!
//! Extracts `page` and `page_size` query parameters.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use workforce_persistence::core::{RecordStorage, TenantDirectory};
use workforce_persistence::types::Pagination;

use crate::error::RestError;
use crate::state::AppState;

/// Axum extractor for listing pagination.
///
/// `page` defaults to 0 and `page_size` to the configured default; a
/// requested page size is clamped to the configured maximum.
#[derive(Debug, Clone, Copy)]
pub struct PageParams(pub Pagination);

/// Query parameters for pagination.
#[derive(Debug, Deserialize)]
struct PaginationQuery {
    page: Option<u32>,
    page_size: Option<u32>,
}

impl PageParams {
    /// Returns the pagination.
    pub fn into_inner(self) -> Pagination {
        self.0
    }
}

impl<S> FromRequestParts<AppState<S>> for PageParams
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PaginationQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| RestError::BadRequest {
                message: format!("Invalid pagination parameters: {}", e),
            })?;

        let page_size = query.page_size.unwrap_or(state.default_page_size());
        if page_size == 0 {
            return Err(RestError::BadRequest {
                message: "page_size must be at least 1".to_string(),
            });
        }

        Ok(PageParams(
            Pagination::new(query.page.unwrap_or(0), page_size).clamped(state.max_page_size()),
        ))
    }
}
