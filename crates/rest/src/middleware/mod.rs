//! HTTP middleware for the Workforce API.
//!
//! - [`tenant`] - The tenant gate: credential verification, tenant
//!   resolution and admission, context installation

pub mod tenant;

pub use tenant::{X_REQUEST_ID, tenant_gate};
