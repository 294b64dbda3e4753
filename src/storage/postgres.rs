//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresStore`, implementing both the movie catalog and the
//! order repository over a `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! movie-rentals = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! - `movies`: catalog rows, `price` as `NUMERIC(10,2)`, nullable `tag`
//! - `orders`: one row per order with its rounded `total`
//! - `order_movie`: association table, cascading on delete of either side
//!
//! Every order write runs in a single transaction.

use crate::core::error::{PersistenceError, RentalResult};
use crate::core::model::{Movie, MovieId, MoviePatch, NewMovie, OrderId, OrderRecord, Tag};
use crate::core::service::{MovieCatalog, OrderRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

const SCHEMA: &[(&str, &str)] = &[
    (
        "movies",
        "CREATE TABLE IF NOT EXISTS movies (
            id BIGSERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            price NUMERIC(10, 2) NOT NULL CHECK (price >= 0),
            tag VARCHAR(32) NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )",
    ),
    (
        "orders",
        "CREATE TABLE IF NOT EXISTS orders (
            id BIGSERIAL PRIMARY KEY,
            total NUMERIC(10, 2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )",
    ),
    (
        "order_movie",
        "CREATE TABLE IF NOT EXISTS order_movie (
            order_id BIGINT NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
            movie_id BIGINT NOT NULL REFERENCES movies (id) ON DELETE CASCADE,
            PRIMARY KEY (order_id, movie_id)
        )",
    ),
    (
        "idx_order_movie_movie",
        "CREATE INDEX IF NOT EXISTS idx_order_movie_movie ON order_movie (movie_id)",
    ),
];

/// Apply the required tables and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> RentalResult<()> {
    for (name, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| PersistenceError::Query {
                backend: "PostgreSQL".to_string(),
                message: format!("Failed to create {}: {}", name, e),
            })?;
    }

    Ok(())
}

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> RentalResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| {
            PersistenceError::Connection {
                backend: "PostgreSQL".to_string(),
                message: e.to_string(),
            }
            .into()
        })
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

type MovieRow = (i64, String, Decimal, Option<String>, DateTime<Utc>, DateTime<Utc>);
type OrderRow = (i64, Decimal, DateTime<Utc>, DateTime<Utc>);

const MOVIE_COLUMNS: &str = "id, title, price, tag, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, total, created_at, updated_at";

fn movie_from_row(row: MovieRow) -> RentalResult<Movie> {
    let (id, title, price, tag, created_at, updated_at) = row;
    let tag = Tag::from_nullable(tag.as_deref()).map_err(|e| PersistenceError::Integrity {
        message: format!("movie {}: {}", id, e),
    })?;

    Ok(Movie {
        id,
        title,
        price,
        tag,
        created_at,
        updated_at,
    })
}

fn order_from_row(row: OrderRow, movie_ids: BTreeSet<MovieId>) -> OrderRecord {
    let (id, total, created_at, updated_at) = row;
    OrderRecord {
        id,
        total,
        movie_ids,
        created_at,
        updated_at,
    }
}

// ---------------------------------------------------------------------------
// PostgresStore
// ---------------------------------------------------------------------------

/// Catalog and order storage backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// let pool = rentals::storage::postgres::connect("postgres://localhost/rentals", 5).await?;
/// rentals::storage::postgres::ensure_schema(&pool).await?;
/// let store = Arc::new(PostgresStore::new(pool));
/// ```
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn associations(
        &self,
        order_ids: &[OrderId],
    ) -> RentalResult<BTreeMap<OrderId, BTreeSet<MovieId>>> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT order_id, movie_id FROM order_movie WHERE order_id = ANY($1)",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: BTreeMap<OrderId, BTreeSet<MovieId>> = BTreeMap::new();
        for (order_id, movie_id) in rows {
            by_order.entry(order_id).or_default().insert(movie_id);
        }
        Ok(by_order)
    }
}

async fn insert_associations(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    movie_ids: &BTreeSet<MovieId>,
) -> RentalResult<()> {
    let ids: Vec<i64> = movie_ids.iter().copied().collect();
    sqlx::query("INSERT INTO order_movie (order_id, movie_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(order_id)
        .bind(&ids)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl MovieCatalog for PostgresStore {
    async fn find_movies_by_ids(
        &self,
        ids: &BTreeSet<MovieId>,
    ) -> RentalResult<HashMap<MovieId, Movie>> {
        let ids: Vec<i64> = ids.iter().copied().collect();
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies WHERE id = ANY($1)",
            MOVIE_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| movie_from_row(row).map(|m| (m.id, m)))
            .collect()
    }

    async fn list_movies(&self) -> RentalResult<Vec<Movie>> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies ORDER BY id",
            MOVIE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(movie_from_row).collect()
    }

    async fn get_movie(&self, id: MovieId) -> RentalResult<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies WHERE id = $1",
            MOVIE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(movie_from_row).transpose()
    }

    async fn create_movie(&self, movie: NewMovie) -> RentalResult<Movie> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "INSERT INTO movies (title, price, tag, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {}",
            MOVIE_COLUMNS
        ))
        .bind(&movie.title)
        .bind(movie.price)
        .bind(movie.tag.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        movie_from_row(row)
    }

    async fn update_movie(&self, id: MovieId, patch: MoviePatch) -> RentalResult<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "UPDATE movies SET \
                title = COALESCE($1, title), \
                price = COALESCE($2, price), \
                tag = CASE WHEN $3 THEN $4 ELSE tag END, \
                updated_at = $5 \
             WHERE id = $6 RETURNING {}",
            MOVIE_COLUMNS
        ))
        .bind(patch.title.as_deref())
        .bind(patch.price)
        .bind(patch.tag.is_some())
        .bind(patch.tag.and_then(|t| t.as_str()))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(movie_from_row).transpose()
    }

    async fn delete_movie(&self, id: MovieId) -> RentalResult<bool> {
        // order_movie rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn save_order(
        &self,
        total: Decimal,
        movie_ids: &BTreeSet<MovieId>,
    ) -> RentalResult<OrderRecord> {
        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (total, created_at, updated_at) VALUES ($1, $2, $2) RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(total)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_associations(&mut tx, row.0, movie_ids).await?;
        tx.commit().await?;

        Ok(order_from_row(row, movie_ids.clone()))
    }

    async fn replace_order(
        &self,
        id: OrderId,
        total: Decimal,
        movie_ids: &BTreeSet<MovieId>,
    ) -> RentalResult<Option<OrderRecord>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET total = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(total)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM order_movie WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_associations(&mut tx, id, movie_ids).await?;
        tx.commit().await?;

        Ok(Some(order_from_row(row, movie_ids.clone())))
    }

    async fn delete_order(&self, id: OrderId) -> RentalResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_movie WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_order(&self, id: OrderId) -> RentalResult<Option<OrderRecord>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut associations = self.associations(&[id]).await?;
        let movie_ids = associations.remove(&id).unwrap_or_default();
        Ok(Some(order_from_row(row, movie_ids)))
    }

    async fn list_orders(&self) -> RentalResult<Vec<OrderRecord>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders ORDER BY id",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<OrderId> = rows.iter().map(|r| r.0).collect();
        let mut associations = self.associations(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let movie_ids = associations.remove(&row.0).unwrap_or_default();
                order_from_row(row, movie_ids)
            })
            .collect())
    }
}
