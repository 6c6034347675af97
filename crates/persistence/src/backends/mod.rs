//! Database backend implementations.
//!
//! Each backend implements [`RecordStorage`](crate::core::RecordStorage),
//! [`TenantDirectory`](crate::core::TenantDirectory) and
//! [`Backend`](crate::core::Backend), and is gated behind a feature flag.
//!
//! # Available Backends
//!
//! | Backend | Feature | Isolation mechanism |
//! |---------|---------|---------------------|
//! | SQLite | `sqlite` | Per-connection TEMP view and triggers |
//! | PostgreSQL | `postgres` | Forced row-level security policy |
//!
//! Both bind the tenant on every connection borrow and refuse to run a unit
//! of work when binding fails.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! use workforce_persistence::backends::sqlite::SqliteBackend;
//!
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an in-memory SQLite backend
//! let backend = SqliteBackend::in_memory()?;
//!
//! // Or use a file-based database
//! let backend = SqliteBackend::open("./data/workforce.db")?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;
