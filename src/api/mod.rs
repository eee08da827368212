//! Axum HTTP surface: shared state, router and request handlers.
pub mod handlers;
pub mod routes;
