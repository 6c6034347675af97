//! Route configuration for the Workforce API.

pub mod routes;

pub use routes::create_routes;
