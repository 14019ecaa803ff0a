//!
//! # Custom Error Handling
//!
//! This module defines the `AppError` type returned by services, extractors and
//! handlers. Every variant maps to one HTTP status and a JSON body of the form
//! `{"error": "<message>"}`.
//!
//! `From` implementations for `StoreError`, `validator::ValidationErrors`,
//! `bcrypt::BcryptError` and `TokenError` allow the `?` operator throughout the
//! request path. Storage and internal failures are logged with their detail and
//! surfaced to the client with a generic message.

use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::store::StoreError;

/// Represents all errors that can reach the request boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, invalid or expired credentials (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The authenticated user lacks the membership or role required (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The token subject resolved to a deactivated account (HTTP 400).
    #[error("Inactive user")]
    InactiveUser,
    /// A unique key is already taken (HTTP 400).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A structurally disallowed action, such as removing a project owner (HTTP 400).
    #[error("Invalid Operation: {0}")]
    InvalidOperation(String),
    /// Referenced entity absent (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Failed input validation (HTTP 422).
    #[error("Validation Error: {0}")]
    ValidationError(String),
    /// Failure in the storage layer (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// Any other unexpected server-side failure (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InactiveUser
            | AppError::Conflict(_)
            | AppError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidOperation(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => msg.clone(),
            AppError::InactiveUser => "Inactive user".to_string(),
            AppError::DatabaseError(detail) | AppError::InternalServerError(detail) => {
                log::error!("request failed: {}", detail);
                "Internal server error".to_string()
            }
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let AppError::Unauthorized(_) = self {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "error": message }))
    }
}

/// Unique violations become conflicts; everything else the store reports is a
/// server error. Services that know which key collided map `UniqueViolation`
/// themselves before this fallback applies.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::UniqueViolation(msg) => AppError::Conflict(msg),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Signing(detail) => AppError::InternalServerError(detail),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
