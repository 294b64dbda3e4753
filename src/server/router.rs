//! Route table of the rental API

use super::handlers::{AppState, movies, orders};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Build the `/api` resource routes
///
/// - GET, POST /api/movies
/// - GET, PUT, DELETE /api/movies/{id}
/// - GET, POST /api/orders
/// - GET, PUT, DELETE /api/orders/{id}
pub fn build_api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/movies",
            get(movies::list_movies).post(movies::create_movie),
        )
        .route(
            "/api/movies/{id}",
            get(movies::get_movie)
                .put(movies::update_movie)
                .delete(movies::delete_movie),
        )
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/api/orders/{id}",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "movie-rentals"
    }))
}
