//! HTTP server exposing the catalog and order routes
//!
//! This module provides a `ServerBuilder` that wires the storage backend, the
//! pricing configuration and the order assembler into an axum `Router`.

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
