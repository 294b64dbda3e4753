//! Order handlers, thin wrappers over the order assembler

use super::{AppState, MessageResponse, parse_id};
use crate::core::error::RentalResult;
use crate::core::model::Order;
use crate::core::validation::{OrderInput, Validated};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// GET /api/orders
pub async fn list_orders(State(state): State<AppState>) -> RentalResult<Json<Vec<Order>>> {
    Ok(Json(state.assembler.list_orders().await?))
}

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Validated(input): Validated<OrderInput>,
) -> RentalResult<(StatusCode, Json<Order>)> {
    let order = state
        .assembler
        .create_order_from_positions(input.positions())
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> RentalResult<Json<Order>> {
    let id = parse_id(&raw_id)?;
    Ok(Json(state.assembler.get_order(id).await?))
}

/// PUT /api/orders/{id}
pub async fn update_order(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Validated(input): Validated<OrderInput>,
) -> RentalResult<Json<Order>> {
    let id = parse_id(&raw_id)?;
    let order = state
        .assembler
        .update_order_from_positions(id, input.positions())
        .await?;
    Ok(Json(order))
}

/// DELETE /api/orders/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> RentalResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id)?;
    state.assembler.delete_order(id).await?;

    Ok(Json(MessageResponse {
        message: "Order deleted successfully.",
    }))
}
