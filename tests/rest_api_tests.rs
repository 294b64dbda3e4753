//! End-to-end tests of the REST API over the in-memory store
//!
//! These tests verify the complete flow from HTTP request to response,
//! including pricing, order assembly and error rendering.

use axum::http::StatusCode;
use axum_test::TestServer;
use rentals::prelude::*;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

// =============================================================================
// Helpers
// =============================================================================

fn create_test_server() -> (TestServer, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());

    let app = ServerBuilder::new()
        .with_store(store.clone())
        .build()
        .expect("Failed to build app");

    let server = TestServer::try_new(app).expect("Failed to create test server");

    (server, store)
}

/// Adds the 10.00 trending, 20.00 under and 30.00 untagged movies
async fn add_mixed_movies(store: &InMemoryStore) -> Vec<MovieId> {
    let mut ids = Vec::new();
    for (title, price, tag) in [
        ("Inception", dec!(10.00), Tag::Trending),
        ("The Shawshank Redemption", dec!(20.00), Tag::Under),
        ("Interstellar", dec!(30.00), Tag::None),
    ] {
        let movie = store
            .create_movie(NewMovie::new(title, price, tag))
            .await
            .unwrap();
        ids.push(movie.id);
    }
    ids
}

fn movie_ids_of(order: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = order["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    ids.sort();
    ids
}

// =============================================================================
// Health Check Tests
// =============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _) = create_test_server();

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "movie-rentals");
    }
}

// =============================================================================
// Movie Catalog Tests
// =============================================================================

mod movie_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_movies_carries_adjusted_price() {
        let (server, store) = create_test_server();
        add_mixed_movies(&store).await;

        let response = server.get("/api/movies").await;
        response.assert_status_ok();

        let body: Vec<Value> = response.json();
        assert_eq!(body.len(), 3);
        assert_eq!(body[0]["title"], "Inception");
        assert_eq!(body[0]["price"], json!(10.0));
        assert_eq!(body[0]["tag"], "trending");
        assert_eq!(body[0]["adjusted_price"], json!(13.5));
        assert_eq!(body[1]["adjusted_price"], json!(10.0));
        assert_eq!(body[2]["tag"], Value::Null);
        assert_eq!(body[2]["adjusted_price"], json!(30.0));
    }

    #[tokio::test]
    async fn test_create_movie() {
        let (server, _) = create_test_server();

        let response = server
            .post("/api/movies")
            .json(&json!({"title": "Heat", "price": 9.5, "tag": "under"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["id"], 1);
        assert_eq!(body["title"], "Heat");
        assert_eq!(body["adjusted_price"], json!(4.75));
    }

    #[tokio::test]
    async fn test_create_movie_validation() {
        let (server, _) = create_test_server();

        let response = server
            .post("/api/movies")
            .json(&json!({"title": "", "price": -3, "tag": "classic"}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["details"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["title", "price", "tag"]);
    }

    #[tokio::test]
    async fn test_create_movie_rejects_price_beyond_storage_range() {
        let (server, _) = create_test_server();

        let response = server
            .post("/api/movies")
            .json(&json!({
                "title": "Heat",
                "price": "79228162514264337593543950335",
                "tag": "trending"
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["details"]["fields"][0]["field"], "price");

        // nothing was stored, so the listing still prices every movie
        let listing = server.get("/api/movies").await;
        listing.assert_status_ok();
        let movies: Vec<Value> = listing.json();
        assert!(movies.is_empty());
    }

    #[tokio::test]
    async fn test_create_movie_rejects_sub_cent_price() {
        let (server, _) = create_test_server();

        let response = server
            .post("/api/movies")
            .json(&json!({"title": "Heat", "price": "8.755", "tag": "trending"}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(
            body["details"]["fields"][0]["message"],
            "The price field must have at most 2 decimal places."
        );
    }

    #[tokio::test]
    async fn test_listing_reports_unpriceable_movie_instead_of_failing() {
        let (server, store) = create_test_server();
        store
            .create_movie(NewMovie::new("Huge", Decimal::MAX, Tag::Trending))
            .await
            .unwrap();

        let response = server.get("/api/movies").await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_movie_partially_and_clear_tag() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;

        let response = server
            .put(&format!("/api/movies/{}", ids[0]))
            .json(&json!({"tag": null}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["title"], "Inception");
        assert_eq!(body["tag"], Value::Null);
        assert_eq!(body["adjusted_price"], json!(10.0));
    }

    #[tokio::test]
    async fn test_get_missing_movie() {
        let (server, _) = create_test_server();

        let response = server.get("/api/movies/77").await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["code"], "MOVIE_NOT_FOUND");
        assert_eq!(body["details"]["id"], 77);
    }

    #[tokio::test]
    async fn test_delete_movie() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;

        let response = server.delete(&format!("/api/movies/{}", ids[1])).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Movie deleted successfully.");

        server
            .get(&format!("/api/movies/{}", ids[1]))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_delete_movie_drops_it_from_orders_but_keeps_total() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;

        let order: Value = server
            .post("/api/orders")
            .json(&json!({"movie_ids": ids}))
            .await
            .json();

        server
            .delete(&format!("/api/movies/{}", ids[0]))
            .await
            .assert_status_ok();

        let fetched: Value = server
            .get(&format!("/api/orders/{}", order["id"]))
            .await
            .json();
        assert_eq!(movie_ids_of(&fetched), vec![ids[1], ids[2]]);
        assert_eq!(fetched["total"], json!(53.5));
    }
}

// =============================================================================
// Order Tests
// =============================================================================

mod order_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_order_mixed_tags() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;

        let response = server
            .post("/api/orders")
            .json(&json!({"movie_ids": ids}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["total"], json!(53.5));
        assert_eq!(movie_ids_of(&body), ids);
        assert_eq!(body["movies"][0]["title"], "Inception");
    }

    #[tokio::test]
    async fn test_create_order_with_unknown_movies() {
        let (server, _) = create_test_server();

        let response = server
            .post("/api/orders")
            .json(&json!({"movie_ids": [999, 1000]}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["unknown_movie_ids"], json!([999, 1000]));
        assert_eq!(body["details"]["fields"][0]["field"], "movie_ids.0");
        assert_eq!(body["details"]["fields"][1]["field"], "movie_ids.1");

        let orders: Vec<Value> = server.get("/api/orders").await.json();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_create_order_with_non_integer_ids() {
        let (server, store) = create_test_server();
        add_mixed_movies(&store).await;

        let response = server
            .post("/api/orders")
            .json(&json!({"movie_ids": [1, "two"]}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["details"]["fields"][0]["field"], "movie_ids.1");
        assert_eq!(
            body["details"]["fields"][0]["message"],
            "The selected movie_ids.1 is invalid."
        );
    }

    #[tokio::test]
    async fn test_create_order_reports_malformed_and_unknown_ids_together() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;

        let response = server
            .post("/api/orders")
            .json(&json!({"movie_ids": [ids[0], "x", 999]}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        let fields: Vec<&str> = body["details"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["movie_ids.1", "movie_ids.2"]);
        assert_eq!(body["details"]["unknown_movie_ids"], json!([999]));

        let orders: Vec<Value> = server.get("/api/orders").await.json();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_create_order_with_overflowing_total() {
        let (server, store) = create_test_server();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let movie = store
                .create_movie(NewMovie::new("Huge", Decimal::MAX, Tag::None))
                .await
                .unwrap();
            ids.push(movie.id);
        }

        let response = server
            .post("/api/orders")
            .json(&json!({"movie_ids": ids}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["details"]["fields"][0]["field"], "movie_ids");
    }

    #[tokio::test]
    async fn test_create_order_requires_ids() {
        let (server, _) = create_test_server();

        let response = server.post("/api/orders").json(&json!({})).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["details"]["fields"][0]["field"], "movie_ids");
    }

    #[tokio::test]
    async fn test_get_order_is_idempotent() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;
        let created: Value = server
            .post("/api/orders")
            .json(&json!({"movie_ids": [ids[0]]}))
            .await
            .json();

        let first: Value = server
            .get(&format!("/api/orders/{}", created["id"]))
            .await
            .json();
        let second: Value = server
            .get(&format!("/api/orders/{}", created["id"]))
            .await
            .json();

        assert_eq!(first, second);
        assert_eq!(first["total"], json!(13.5));
    }

    #[tokio::test]
    async fn test_update_order_replaces_movies() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;
        let created: Value = server
            .post("/api/orders")
            .json(&json!({"movie_ids": [ids[0], ids[1]]}))
            .await
            .json();

        let response = server
            .put(&format!("/api/orders/{}", created["id"]))
            .json(&json!({"movie_ids": [ids[2]]}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], created["id"]);
        assert_eq!(movie_ids_of(&body), vec![ids[2]]);
        assert_eq!(body["total"], json!(30.0));
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;

        let response = server
            .put("/api/orders/404")
            .json(&json!({"movie_ids": [ids[0]]}))
            .await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["code"], "ORDER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_missing_order_with_malformed_ids() {
        let (server, _) = create_test_server();

        let response = server
            .put("/api/orders/404")
            .json(&json!({"movie_ids": ["x"]}))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_delete_order_then_get() {
        let (server, store) = create_test_server();
        let ids = add_mixed_movies(&store).await;
        let created: Value = server
            .post("/api/orders")
            .json(&json!({"movie_ids": ids}))
            .await
            .json();
        let path = format!("/api/orders/{}", created["id"]);

        let response = server.delete(&path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Order deleted successfully.");

        server.get(&path).await.assert_status_not_found();
        server.delete(&path).await.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_total_rounds_up() {
        let (server, store) = create_test_server();
        let a = store
            .create_movie(NewMovie::new("The Matrix", dec!(11.00), Tag::Trending))
            .await
            .unwrap();
        let b = store
            .create_movie(NewMovie::new("Fight Club", dec!(8.75), Tag::Under))
            .await
            .unwrap();

        let body: Value = server
            .post("/api/orders")
            .json(&json!({"movie_ids": [a.id, b.id]}))
            .await
            .json();

        // 14.85 + 4.375 = 19.225
        assert_eq!(body["total"], json!(19.23));
    }
}

// =============================================================================
// Request Error Tests
// =============================================================================

mod request_error_tests {
    use super::*;

    #[tokio::test]
    async fn test_non_numeric_path_id() {
        let (server, _) = create_test_server();

        let response = server.get("/api/orders/abc").await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_ENTITY_ID");
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let (server, _) = create_test_server();

        let response = server
            .post("/api/orders")
            .bytes("{\"movie_ids\": [1,".into())
            .content_type("application/json")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_persistence_errors_are_masked() {
        let err: RentalError = PersistenceError::Query {
            backend: "PostgreSQL".to_string(),
            message: "relation \"orders\" does not exist".to_string(),
        }
        .into();

        let response = err.to_response();
        assert_eq!(response.code, "PERSISTENCE_ERROR");
        assert!(!response.message.contains("relation"));
    }
}
