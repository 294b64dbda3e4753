//! Core module containing the domain types, pricing and order assembly

pub mod assembler;
pub mod error;
pub mod model;
pub mod pricing;
pub mod service;
pub mod validation;

pub use assembler::OrderAssembler;
pub use error::{RentalError, RentalResult};
pub use model::{Movie, MovieId, MoviePatch, NewMovie, Order, OrderId, OrderRecord, PricedMovie, Tag};
pub use pricing::{PricingEngine, ceil_to_cents};
pub use service::{MovieCatalog, OrderRepository};
