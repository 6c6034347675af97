//! Core types for the persistence layer.
//!
//! - [`StoredRecord`] - A tenant-owned JSON record with persistence metadata
//! - [`RecordKind`] - The record kinds the platform stores
//! - [`Pagination`], [`Page`] - Offset pagination

mod pagination;
mod record;

pub use pagination::{DEFAULT_PAGE_SIZE, Page, Pagination};
pub use record::{RecordKind, StoredRecord, ensure_object, requested_local_id};
