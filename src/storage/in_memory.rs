//! In-memory implementation of the catalog and order repository
//!
//! Useful for testing and development. One `RwLock` guards all tables, so
//! every write (order row plus its associations) is a single critical section.

use crate::core::error::{PersistenceError, RentalResult};
use crate::core::model::{Movie, MovieId, MoviePatch, NewMovie, OrderId, OrderRecord};
use crate::core::service::{MovieCatalog, OrderRepository};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    movies: BTreeMap<MovieId, Movie>,
    orders: BTreeMap<OrderId, OrderRecord>,
    next_movie_id: MovieId,
    next_order_id: OrderId,
}

impl Tables {
    fn allocate_movie_id(&mut self) -> MovieId {
        self.next_movie_id += 1;
        self.next_movie_id
    }

    fn allocate_order_id(&mut self) -> OrderId {
        self.next_order_id += 1;
        self.next_order_id
    }
}

/// In-memory store implementing both [`MovieCatalog`] and [`OrderRepository`]
///
/// Ids are assigned sequentially from 1 and never reused.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RentalResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|e| {
            PersistenceError::Transaction {
                message: format!("Failed to acquire read lock: {}", e),
            }
            .into()
        })
    }

    fn write(&self) -> RentalResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|e| {
            PersistenceError::Transaction {
                message: format!("Failed to acquire write lock: {}", e),
            }
            .into()
        })
    }
}

#[async_trait]
impl MovieCatalog for InMemoryStore {
    async fn find_movies_by_ids(
        &self,
        ids: &BTreeSet<MovieId>,
    ) -> RentalResult<HashMap<MovieId, Movie>> {
        let tables = self.read()?;

        Ok(ids
            .iter()
            .filter_map(|id| tables.movies.get(id).map(|m| (*id, m.clone())))
            .collect())
    }

    async fn list_movies(&self) -> RentalResult<Vec<Movie>> {
        let tables = self.read()?;
        Ok(tables.movies.values().cloned().collect())
    }

    async fn get_movie(&self, id: MovieId) -> RentalResult<Option<Movie>> {
        let tables = self.read()?;
        Ok(tables.movies.get(&id).cloned())
    }

    async fn create_movie(&self, movie: NewMovie) -> RentalResult<Movie> {
        let mut tables = self.write()?;

        let now = Utc::now();
        let movie = Movie {
            id: tables.allocate_movie_id(),
            title: movie.title,
            price: movie.price,
            tag: movie.tag,
            created_at: now,
            updated_at: now,
        };
        tables.movies.insert(movie.id, movie.clone());

        Ok(movie)
    }

    async fn update_movie(&self, id: MovieId, patch: MoviePatch) -> RentalResult<Option<Movie>> {
        let mut tables = self.write()?;

        Ok(tables.movies.get_mut(&id).map(|movie| {
            patch.apply(movie, Utc::now());
            movie.clone()
        }))
    }

    async fn delete_movie(&self, id: MovieId) -> RentalResult<bool> {
        let mut tables = self.write()?;

        if tables.movies.remove(&id).is_none() {
            return Ok(false);
        }
        for order in tables.orders.values_mut() {
            order.movie_ids.remove(&id);
        }

        Ok(true)
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn save_order(
        &self,
        total: Decimal,
        movie_ids: &BTreeSet<MovieId>,
    ) -> RentalResult<OrderRecord> {
        let mut tables = self.write()?;

        if let Some(missing) = movie_ids.iter().find(|id| !tables.movies.contains_key(*id)) {
            return Err(PersistenceError::Integrity {
                message: format!("movie {} does not exist", missing),
            }
            .into());
        }

        let now = Utc::now();
        let record = OrderRecord {
            id: tables.allocate_order_id(),
            total,
            movie_ids: movie_ids.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(record.id, record.clone());

        Ok(record)
    }

    async fn replace_order(
        &self,
        id: OrderId,
        total: Decimal,
        movie_ids: &BTreeSet<MovieId>,
    ) -> RentalResult<Option<OrderRecord>> {
        let mut tables = self.write()?;

        if let Some(missing) = movie_ids.iter().find(|id| !tables.movies.contains_key(*id)) {
            return Err(PersistenceError::Integrity {
                message: format!("movie {} does not exist", missing),
            }
            .into());
        }

        Ok(tables.orders.get_mut(&id).map(|order| {
            order.total = total;
            order.movie_ids = movie_ids.clone();
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn delete_order(&self, id: OrderId) -> RentalResult<bool> {
        let mut tables = self.write()?;
        Ok(tables.orders.remove(&id).is_some())
    }

    async fn get_order(&self, id: OrderId) -> RentalResult<Option<OrderRecord>> {
        let tables = self.read()?;
        Ok(tables.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> RentalResult<Vec<OrderRecord>> {
        let tables = self.read()?;
        Ok(tables.orders.values().cloned().collect())
    }
}
