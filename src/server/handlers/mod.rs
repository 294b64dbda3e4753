//! HTTP handlers for the catalog and order routes

pub mod movies;
pub mod orders;

use crate::core::assembler::OrderAssembler;
use crate::core::error::{RentalResult, RequestError};
use crate::core::pricing::PricingEngine;
use crate::core::service::MovieCatalog;
use serde::Serialize;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MovieCatalog>,
    pub assembler: OrderAssembler,
}

impl AppState {
    pub fn pricing(&self) -> &PricingEngine {
        self.assembler.pricing()
    }
}

/// Body of successful delete responses
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Parse a numeric path id
///
/// Taken as a raw string so malformed ids report `INVALID_ENTITY_ID` instead
/// of axum's plain-text path rejection.
pub fn parse_id(raw: &str) -> RentalResult<i64> {
    raw.parse::<i64>().map_err(|_| {
        RequestError::InvalidEntityId {
            id: raw.to_string(),
        }
        .into()
    })
}
