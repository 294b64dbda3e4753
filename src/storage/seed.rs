//! Demo catalog and sample orders
//!
//! Orders are placed through the order assembler, so their totals follow the
//! same pricing and rounding as any other order.

use crate::core::assembler::OrderAssembler;
use crate::core::error::RentalResult;
use crate::core::model::{MovieId, NewMovie, Tag};
use crate::core::service::MovieCatalog;
use rust_decimal::Decimal;

/// The demo catalog
pub fn demo_movies() -> Vec<NewMovie> {
    [
        ("Inception", 1000, Tag::Trending),
        ("The Shawshank Redemption", 800, Tag::Under),
        ("Interstellar", 1200, Tag::None),
        ("The Dark Knight", 1500, Tag::Trending),
        ("Pulp Fiction", 950, Tag::Under),
        ("Forrest Gump", 1050, Tag::None),
        ("The Matrix", 1100, Tag::Trending),
        ("Fight Club", 875, Tag::Under),
    ]
    .into_iter()
    .map(|(title, cents, tag)| NewMovie::new(title, Decimal::new(cents, 2), tag))
    .collect()
}

/// Sample orders, as positions into [`demo_movies`]
const DEMO_ORDERS: &[&[usize]] = &[&[0, 1], &[6, 7], &[2, 4]];

/// What [`seed_demo_data`] inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub movies: usize,
    pub orders: usize,
}

/// Insert the demo catalog and sample orders
///
/// Skipped when the catalog already holds movies.
pub async fn seed_demo_data(
    catalog: &dyn MovieCatalog,
    assembler: &OrderAssembler,
) -> RentalResult<SeedSummary> {
    if !catalog.list_movies().await?.is_empty() {
        tracing::info!("catalog not empty, skipping demo data");
        return Ok(SeedSummary {
            movies: 0,
            orders: 0,
        });
    }

    let mut ids: Vec<MovieId> = Vec::new();
    for movie in demo_movies() {
        ids.push(catalog.create_movie(movie).await?.id);
    }

    for positions in DEMO_ORDERS {
        let movie_ids = positions.iter().map(|&p| ids[p]).collect();
        assembler.create_order(movie_ids).await?;
    }

    let summary = SeedSummary {
        movies: ids.len(),
        orders: DEMO_ORDERS.len(),
    };
    tracing::info!(movies = summary.movies, orders = summary.orders, "demo data seeded");
    Ok(summary)
}
