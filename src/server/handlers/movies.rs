//! Catalog handlers
//!
//! Every movie in a response carries its tag-adjusted price.

use super::{AppState, MessageResponse, parse_id};
use crate::core::error::{NotFoundError, RentalResult};
use crate::core::model::{MoviePatch, NewMovie, PricedMovie};
use crate::core::validation::Validated;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// GET /api/movies
pub async fn list_movies(State(state): State<AppState>) -> RentalResult<Json<Vec<PricedMovie>>> {
    let movies = state.catalog.list_movies().await?;
    let pricing = state.pricing();

    let priced = movies
        .into_iter()
        .map(|m| pricing.price_movie(m))
        .collect::<RentalResult<Vec<_>>>()?;
    Ok(Json(priced))
}

/// POST /api/movies
pub async fn create_movie(
    State(state): State<AppState>,
    Validated(draft): Validated<NewMovie>,
) -> RentalResult<(StatusCode, Json<PricedMovie>)> {
    // reject before storing anything the listing could not price
    state.pricing().adjusted_price(draft.price, draft.tag)?;

    let movie = state.catalog.create_movie(draft).await?;
    tracing::info!(movie_id = movie.id, title = %movie.title, "movie created");

    Ok((StatusCode::CREATED, Json(state.pricing().price_movie(movie)?)))
}

/// GET /api/movies/{id}
pub async fn get_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> RentalResult<Json<PricedMovie>> {
    let id = parse_id(&raw_id)?;
    let movie = state
        .catalog
        .get_movie(id)
        .await?
        .ok_or(NotFoundError::Movie { id })?;

    Ok(Json(state.pricing().price_movie(movie)?))
}

/// PUT /api/movies/{id}
pub async fn update_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Validated(patch): Validated<MoviePatch>,
) -> RentalResult<Json<PricedMovie>> {
    let id = parse_id(&raw_id)?;
    let movie = state
        .catalog
        .update_movie(id, patch)
        .await?
        .ok_or(NotFoundError::Movie { id })?;

    Ok(Json(state.pricing().price_movie(movie)?))
}

/// DELETE /api/movies/{id}
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> RentalResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id)?;
    if !state.catalog.delete_movie(id).await? {
        return Err(NotFoundError::Movie { id }.into());
    }
    tracing::info!(movie_id = id, "movie deleted");

    Ok(Json(MessageResponse {
        message: "Movie deleted successfully.",
    }))
}
