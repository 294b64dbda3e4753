//! Order assembly: id resolution, pricing, rounding and atomic persistence

use crate::core::error::{
    NotFoundError, PersistenceError, RentalError, RentalResult, UnknownMovie, ValidationError,
};
use crate::core::model::{Movie, MovieId, Order, OrderId, OrderRecord};
use crate::core::pricing::PricingEngine;
use crate::core::service::{MovieCatalog, OrderRepository};
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default deadline of a whole create/update operation
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Turns a list of movie ids into a persisted, priced order
///
/// Stateless between calls; cloning shares the underlying collaborators.
#[derive(Clone)]
pub struct OrderAssembler {
    catalog: Arc<dyn MovieCatalog>,
    orders: Arc<dyn OrderRepository>,
    pricing: PricingEngine,
    deadline: Duration,
}

impl OrderAssembler {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        orders: Arc<dyn OrderRepository>,
        pricing: PricingEngine,
    ) -> Self {
        Self {
            catalog,
            orders,
            pricing,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Replace the deadline applied to create and update
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// Create an order from the given movie ids
    ///
    /// Every id must resolve; otherwise nothing is persisted and the error
    /// lists each offending position.
    pub async fn create_order(&self, movie_ids: Vec<MovieId>) -> RentalResult<Order> {
        self.create_order_from_positions(movie_ids.into_iter().map(Some).collect())
            .await
    }

    /// Create an order from raw request positions
    ///
    /// `None` marks a position that held no integer id; it is reported in the
    /// same error as the ids missing from the catalog.
    ///
    /// The deadline covers the whole operation. When it expires after the
    /// store has committed, the caller sees a timeout although the order was
    /// saved.
    pub async fn create_order_from_positions(
        &self,
        positions: Vec<Option<MovieId>>,
    ) -> RentalResult<Order> {
        self.within_deadline("create_order", async {
            let (ids, movies) = self.resolve_movies(&positions).await?;
            let total = self.pricing.order_total(&movies)?;

            let record = match self.orders.save_order(total, &ids).await {
                Ok(record) => record,
                Err(err) => return Err(self.explain_write_failure(&positions, err).await),
            };
            tracing::info!(order_id = record.id, %total, movies = ids.len(), "order created");

            Ok(assemble(record, movies))
        })
        .await
    }

    /// Replace an order's movie set and recompute its total
    ///
    /// The previous associations are dropped, not merged.
    pub async fn update_order(
        &self,
        order_id: OrderId,
        movie_ids: Vec<MovieId>,
    ) -> RentalResult<Order> {
        self.update_order_from_positions(order_id, movie_ids.into_iter().map(Some).collect())
            .await
    }

    /// Replace an order's movie set from raw request positions
    ///
    /// A missing order is reported before any id is checked. Deadline expiry
    /// behaves as in [`OrderAssembler::create_order_from_positions`].
    pub async fn update_order_from_positions(
        &self,
        order_id: OrderId,
        positions: Vec<Option<MovieId>>,
    ) -> RentalResult<Order> {
        self.within_deadline("update_order", async {
            if self.orders.get_order(order_id).await?.is_none() {
                return Err(NotFoundError::Order { id: order_id }.into());
            }

            let (ids, movies) = self.resolve_movies(&positions).await?;
            let total = self.pricing.order_total(&movies)?;

            let replaced = match self.orders.replace_order(order_id, total, &ids).await {
                Ok(replaced) => replaced,
                Err(err) => return Err(self.explain_write_failure(&positions, err).await),
            };
            let record = replaced.ok_or(NotFoundError::Order { id: order_id })?;
            tracing::info!(order_id, %total, movies = ids.len(), "order updated");

            Ok(assemble(record, movies))
        })
        .await
    }

    /// Fetch one order with its movies
    pub async fn get_order(&self, order_id: OrderId) -> RentalResult<Order> {
        let record = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or(NotFoundError::Order { id: order_id })?;

        let mut found = self.catalog.find_movies_by_ids(&record.movie_ids).await?;
        let movies = take_in_order(&record.movie_ids, &mut found);
        Ok(assemble(record, movies))
    }

    /// All orders with their movies, resolved in a single catalog lookup
    pub async fn list_orders(&self) -> RentalResult<Vec<Order>> {
        let records = self.orders.list_orders().await?;

        let all_ids: BTreeSet<MovieId> = records
            .iter()
            .flat_map(|r| r.movie_ids.iter().copied())
            .collect();
        let found = if all_ids.is_empty() {
            HashMap::new()
        } else {
            self.catalog.find_movies_by_ids(&all_ids).await?
        };

        Ok(records
            .into_iter()
            .map(|record| {
                let movies = record
                    .movie_ids
                    .iter()
                    .filter_map(|id| found.get(id).cloned())
                    .collect();
                assemble(record, movies)
            })
            .collect())
    }

    /// Delete an order and its associations
    pub async fn delete_order(&self, order_id: OrderId) -> RentalResult<()> {
        if !self.orders.delete_order(order_id).await? {
            return Err(NotFoundError::Order { id: order_id }.into());
        }
        tracing::info!(order_id, "order deleted");
        Ok(())
    }

    /// Batch-resolve the requested positions against the catalog
    ///
    /// Returns the collapsed id set and the movies ordered by id. Malformed
    /// positions and unknown ids are reported together, one entry per index.
    async fn resolve_movies(
        &self,
        positions: &[Option<MovieId>],
    ) -> RentalResult<(BTreeSet<MovieId>, Vec<Movie>)> {
        if positions.is_empty() {
            return Err(ValidationError::FieldError {
                field: "movie_ids".to_string(),
                message: "The movie ids field is required.".to_string(),
            }
            .into());
        }

        let ids: BTreeSet<MovieId> = positions.iter().flatten().copied().collect();
        let mut found = if ids.is_empty() {
            HashMap::new()
        } else {
            self.catalog.find_movies_by_ids(&ids).await?
        };

        let mut malformed = Vec::new();
        let mut unknown = Vec::new();
        for (index, position) in positions.iter().enumerate() {
            match position {
                None => malformed.push(index),
                Some(id) if !found.contains_key(id) => {
                    unknown.push(UnknownMovie { index, id: *id });
                }
                Some(_) => {}
            }
        }

        if !malformed.is_empty() {
            tracing::debug!(
                malformed = malformed.len(),
                missing = unknown.len(),
                "order references invalid movie ids"
            );
            return Err(ValidationError::InvalidMovieIds { malformed, unknown }.into());
        }
        if !unknown.is_empty() {
            tracing::debug!(missing = unknown.len(), "order references unknown movies");
            return Err(ValidationError::UnknownMovies(unknown).into());
        }

        let movies = take_in_order(&ids, &mut found);
        Ok((ids, movies))
    }

    /// A movie deleted between resolution and the write reaches us as an
    /// integrity failure from the store; report it as an unknown id.
    async fn explain_write_failure(
        &self,
        positions: &[Option<MovieId>],
        err: RentalError,
    ) -> RentalError {
        if !matches!(
            err,
            RentalError::Persistence(PersistenceError::Integrity { .. })
        ) {
            return err;
        }

        match self.resolve_movies(positions).await {
            Err(validation @ RentalError::Validation(_)) => {
                tracing::warn!("movie removed while the order was being written");
                validation
            }
            _ => err,
        }
    }

    async fn within_deadline<T, F>(&self, operation: &'static str, fut: F) -> RentalResult<T>
    where
        F: Future<Output = RentalResult<T>>,
    {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, deadline = ?self.deadline, "deadline exceeded");
                Err(PersistenceError::Timeout {
                    operation,
                    deadline: self.deadline,
                }
                .into())
            }
        }
    }
}

fn take_in_order(ids: &BTreeSet<MovieId>, found: &mut HashMap<MovieId, Movie>) -> Vec<Movie> {
    ids.iter().filter_map(|id| found.remove(id)).collect()
}

fn assemble(record: OrderRecord, movies: Vec<Movie>) -> Order {
    Order {
        id: record.id,
        total: record.total,
        movies,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}
