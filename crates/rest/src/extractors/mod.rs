//! Axum extractors for the Workforce API.
//!
//! - [`TenantExtractor`] - The tenant context installed by the gate
//! - [`PageParams`] - Listing pagination

mod pagination;
mod tenant;

pub use pagination::PageParams;
pub use tenant::TenantExtractor;
