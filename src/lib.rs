//! # Movie Rentals
//!
//! A movie rental catalog and order service with tag-based price adjustments.
//!
//! ## Features
//!
//! - **Pricing Engine**: maps a movie's tag to a configurable price multiplier
//! - **Order Assembler**: resolves movie ids in one batch, sums exact decimal
//!   prices and rounds the total up to the cent
//! - **Atomic Persistence**: an order and its movie associations are written
//!   together or not at all; updates replace the whole movie set
//! - **Pluggable Storage**: in-memory store, PostgreSQL behind the `postgres`
//!   feature
//! - **REST API**: axum routes for movies and orders with typed JSON errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rentals::prelude::*;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let assembler = OrderAssembler::new(store.clone(), store.clone(), PricingEngine::default());
//!
//! let inception = store
//!     .create_movie(NewMovie::new("Inception", dec!(10.00), Tag::Trending))
//!     .await?;
//! let order = assembler.create_order(vec![inception.id]).await?;
//! assert_eq!(order.total, dec!(13.50));
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        assembler::OrderAssembler,
        error::{
            NotFoundError, PersistenceError, RentalError, RentalResult, UnknownMovie,
            ValidationError,
        },
        model::{Movie, MovieId, MoviePatch, NewMovie, Order, OrderId, OrderRecord, PricedMovie, Tag},
        pricing::{PricingEngine, ceil_to_cents},
        service::{MovieCatalog, OrderRepository},
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresStore;

    // === Config ===
    pub use crate::config::{PriceAdjustments, RentalsConfig, StorageBackend};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use rust_decimal::Decimal;
    pub use std::sync::Arc;
}
