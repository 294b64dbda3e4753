//! Persistence traits for the movie catalog and orders
//!
//! The order assembler is agnostic to the storage mechanism; it only talks to
//! these two traits. A backend may implement both over the same store.

use crate::core::error::RentalResult;
use crate::core::model::{Movie, MovieId, MoviePatch, NewMovie, OrderId, OrderRecord};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

/// Read/write access to the movie catalog
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Resolve a set of ids in one lookup
    ///
    /// Ids with no matching movie are simply absent from the result.
    async fn find_movies_by_ids(
        &self,
        ids: &BTreeSet<MovieId>,
    ) -> RentalResult<HashMap<MovieId, Movie>>;

    /// All movies, ordered by id
    async fn list_movies(&self) -> RentalResult<Vec<Movie>>;

    async fn get_movie(&self, id: MovieId) -> RentalResult<Option<Movie>>;

    async fn create_movie(&self, movie: NewMovie) -> RentalResult<Movie>;

    /// Apply a partial update, `None` when the movie does not exist
    async fn update_movie(&self, id: MovieId, patch: MoviePatch) -> RentalResult<Option<Movie>>;

    /// Remove a movie and its order associations
    ///
    /// Returns `false` when nothing was deleted.
    async fn delete_movie(&self, id: MovieId) -> RentalResult<bool>;
}

/// Atomic persistence of orders and their movie associations
///
/// Every write is all-or-nothing: the order row and its association set are
/// committed together or not at all.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order with the given associations
    async fn save_order(
        &self,
        total: Decimal,
        movie_ids: &BTreeSet<MovieId>,
    ) -> RentalResult<OrderRecord>;

    /// Overwrite the total and replace the full association set
    ///
    /// Returns `None` when the order does not exist.
    async fn replace_order(
        &self,
        id: OrderId,
        total: Decimal,
        movie_ids: &BTreeSet<MovieId>,
    ) -> RentalResult<Option<OrderRecord>>;

    /// Delete the associations, then the order row
    async fn delete_order(&self, id: OrderId) -> RentalResult<bool>;

    async fn get_order(&self, id: OrderId) -> RentalResult<Option<OrderRecord>>;

    /// All orders, ordered by id
    async fn list_orders(&self) -> RentalResult<Vec<OrderRecord>>;
}
