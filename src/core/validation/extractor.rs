//! Axum extractor for validated payloads
//!
//! This module provides the `Validated<T>` extractor that filters and
//! validates request payloads before they reach handlers.

use super::config::ValidationConfig;
use crate::core::error::{RentalError, RequestError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for payloads that support validation
pub trait ValidatableEntity: DeserializeOwned {
    /// Get the validation configuration for this payload
    fn validation_config() -> ValidationConfig;
}

/// Axum extractor that validates, filters and then decodes a JSON payload
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_movie(
///     State(state): State<AppState>,
///     Validated(draft): Validated<NewMovie>,
/// ) -> RentalResult<(StatusCode, Json<PricedMovie>)> {
///     // draft is already validated and filtered
/// }
/// ```
#[derive(Debug)]
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    /// Get the inner payload
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Run a payload through `T`'s validation config and decode it
pub fn validate_payload<T: ValidatableEntity>(payload: Value) -> Result<T, RentalError> {
    let config = T::validation_config();

    let filtered = config.validate_and_filter(payload).map_err(|errors| {
        tracing::debug!(payload = config.payload(), errors = errors.len(), "payload rejected");
        ValidationError::FieldErrors(errors)
    })?;

    serde_json::from_value(filtered).map_err(|e| {
        RequestError::InvalidBody {
            message: e.to_string(),
        }
        .into()
    })
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: ValidatableEntity + Send,
{
    type Rejection = RentalError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<Value> = Json::from_request(req, state).await?;
        validate_payload(payload).map(Validated)
    }
}
