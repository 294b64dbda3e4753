//! Typed error handling for the rental service
//!
//! Every failure the order assembler, the catalog or the HTTP layer can
//! produce is a [`RentalError`]. Callers match on the variant to tell a bad
//! request apart from an infrastructure failure; no string matching needed.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: bad or unknown input (HTTP 422)
//! - [`NotFoundError`]: referenced order or movie does not exist (HTTP 404)
//! - [`PersistenceError`]: storage failure or deadline expiry (HTTP 500)
//! - [`ConfigError`]: configuration parsing and validation
//! - [`RequestError`]: malformed HTTP requests (HTTP 400)
//!
//! # Example
//!
//! ```rust,ignore
//! match assembler.create_order(vec![999, 1000]).await {
//!     Ok(order) => println!("total: {}", order.total),
//!     Err(RentalError::Validation(ValidationError::UnknownMovies(missing))) => {
//!         for m in missing {
//!             println!("movie_ids.{} -> {} does not exist", m.index, m.id);
//!         }
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use crate::core::model::{MovieId, OrderId};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// The main error type of the rental service
#[derive(Debug, Error)]
pub enum RentalError {
    /// Bad or unknown input identifiers
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Referenced resource does not exist
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Storage-layer failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP/Request errors
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RentalError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RentalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RentalError::NotFound(_) => StatusCode::NOT_FOUND,
            RentalError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RentalError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RentalError::Request(e) => e.status_code(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RentalError::Validation(_) => "VALIDATION_ERROR",
            RentalError::NotFound(e) => e.error_code(),
            RentalError::Persistence(_) => "PERSISTENCE_ERROR",
            RentalError::Config(_) => "CONFIG_ERROR",
            RentalError::Request(e) => e.error_code(),
        }
    }

    /// Convert to an error response
    ///
    /// Storage failures are reported generically; their detail only goes to
    /// the server log.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            RentalError::Persistence(_) => "The request could not be completed".to_string(),
            other => other.to_string(),
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            RentalError::NotFound(NotFoundError::Order { id }) => {
                Some(serde_json::json!({ "resource": "order", "id": id }))
            }
            RentalError::NotFound(NotFoundError::Movie { id }) => {
                Some(serde_json::json!({ "resource": "movie", "id": id }))
            }
            RentalError::Validation(e) => {
                let mut details = serde_json::json!({ "fields": e.field_errors() });
                let unknown = e.unknown_movies();
                if !unknown.is_empty() {
                    let ids: Vec<MovieId> = unknown.iter().map(|m| m.id).collect();
                    details["unknown_movie_ids"] = serde_json::json!(ids);
                }
                Some(details)
            }
            _ => None,
        }
    }

    /// True when the failure came from the storage layer
    pub fn is_persistence(&self) -> bool {
        matches!(self, RentalError::Persistence(_))
    }
}

impl IntoResponse for RentalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl FieldValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A requested movie id that did not resolve, with its position in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnknownMovie {
    pub index: usize,
    pub id: MovieId,
}

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more requested movie ids do not exist in the catalog
    #[error("Unknown movie ids: {}", format_unknown(.0))]
    UnknownMovies(Vec<UnknownMovie>),

    /// Some requested positions are not integer ids, others do not exist
    #[error("Invalid movie ids: {}", format_invalid(.malformed, .unknown))]
    InvalidMovieIds {
        malformed: Vec<usize>,
        unknown: Vec<UnknownMovie>,
    },

    /// Single field validation error
    #[error("Validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    #[error("Validation errors: {}", format_fields(.0))]
    FieldErrors(Vec<FieldValidationError>),
}

impl ValidationError {
    /// Flatten into per-field errors, one per offending input position
    pub fn field_errors(&self) -> Vec<FieldValidationError> {
        match self {
            ValidationError::UnknownMovies(missing) => {
                missing.iter().map(|m| invalid_position(m.index)).collect()
            }
            ValidationError::InvalidMovieIds { malformed, unknown } => {
                let mut indexes: Vec<usize> = malformed
                    .iter()
                    .copied()
                    .chain(unknown.iter().map(|m| m.index))
                    .collect();
                indexes.sort_unstable();
                indexes.into_iter().map(invalid_position).collect()
            }
            ValidationError::FieldError { field, message } => {
                vec![FieldValidationError::new(field.clone(), message.clone())]
            }
            ValidationError::FieldErrors(errors) => errors.clone(),
        }
    }

    /// Requested ids that were well-formed but matched no movie
    pub fn unknown_movies(&self) -> &[UnknownMovie] {
        match self {
            ValidationError::UnknownMovies(missing) => missing,
            ValidationError::InvalidMovieIds { unknown, .. } => unknown,
            _ => &[],
        }
    }
}

fn invalid_position(index: usize) -> FieldValidationError {
    FieldValidationError::new(
        format!("movie_ids.{}", index),
        format!("The selected movie_ids.{} is invalid.", index),
    )
}

fn format_invalid(malformed: &[usize], unknown: &[UnknownMovie]) -> String {
    let mut parts: Vec<String> = malformed
        .iter()
        .map(|i| format!("not an id (movie_ids.{})", i))
        .collect();
    parts.extend(
        unknown
            .iter()
            .map(|m| format!("{} (movie_ids.{})", m.id, m.index)),
    );
    parts.join(", ")
}

fn format_unknown(missing: &[UnknownMovie]) -> String {
    missing
        .iter()
        .map(|m| format!("{} (movie_ids.{})", m.id, m.index))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_fields(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Not Found Errors
// =============================================================================

/// A referenced resource does not exist
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("order with id '{id}' not found")]
    Order { id: OrderId },

    #[error("movie with id '{id}' not found")]
    Movie { id: MovieId },
}

impl NotFoundError {
    pub fn error_code(&self) -> &'static str {
        match self {
            NotFoundError::Order { .. } => "ORDER_NOT_FOUND",
            NotFoundError::Movie { .. } => "MOVIE_NOT_FOUND",
        }
    }
}

// =============================================================================
// Persistence Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Connection error
    #[error("Failed to connect to {backend}: {message}")]
    Connection { backend: String, message: String },

    /// Query execution error
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction { message: String },

    /// Data integrity error
    #[error("Data integrity error: {message}")]
    Integrity { message: String },

    /// The whole operation exceeded its deadline
    #[error("Operation '{operation}' exceeded its deadline of {deadline:?}")]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse config{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug, Error)]
pub enum RequestError {
    /// Invalid entity ID format
    #[error("Invalid entity ID format: '{id}'")]
    InvalidEntityId { id: String },

    /// Invalid request body
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::InvalidEntityId { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidEntityId { .. } => "INVALID_ENTITY_ID",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
        }
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_yaml::Error> for RentalError {
    fn from(err: serde_yaml::Error) -> Self {
        RentalError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<axum::extract::rejection::JsonRejection> for RentalError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        RentalError::Request(RequestError::InvalidBody {
            message: err.body_text(),
        })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                PersistenceError::Connection {
                    backend: "PostgreSQL".to_string(),
                    message: err.to_string(),
                }
            }
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                PersistenceError::Integrity {
                    message: db.message().to_string(),
                }
            }
            other => PersistenceError::Query {
                backend: "PostgreSQL".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for RentalError {
    fn from(err: sqlx::Error) -> Self {
        RentalError::Persistence(err.into())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for rental operations
pub type RentalResult<T> = Result<T, RentalError>;
