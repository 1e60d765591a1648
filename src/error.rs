// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API error taxonomy.
//!
//! Every handler failure maps to one of these variants; each variant has
//! a fixed HTTP status and a stable machine-readable `error_code` so
//! clients can branch without parsing messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

/// Failures surfaced by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Login rejected. Deliberately carries no detail: unknown
    /// identifier and wrong password are indistinguishable to callers.
    BadCredentials,
    /// Authenticated but not allowed to do this.
    Forbidden(String),
    /// Uniqueness violation (identifier already taken).
    Conflict(String),
    /// Resource does not exist.
    NotFound(String),
    /// A debit would drive the balance negative.
    InsufficientFunds,
    /// Request failed validation.
    InvalidInput(String),
    /// A backing dependency failed.
    ServiceUnavailable(String),
}

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    error_code: String,
}

impl ApiError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadCredentials => "bad_credentials",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "identifier_taken",
            ApiError::NotFound(_) => "not_found",
            ApiError::InsufficientFunds => "insufficient_funds",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadCredentials => write!(f, "Invalid identifier or password"),
            ApiError::Forbidden(msg) => write!(f, "{msg}"),
            ApiError::Conflict(identifier) => {
                write!(f, "Identifier '{identifier}' is already taken")
            }
            ApiError::NotFound(what) => write!(f, "Not found: {what}"),
            ApiError::InsufficientFunds => write!(f, "Insufficient funds"),
            ApiError::InvalidInput(msg) => write!(f, "{msg}"),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ApiErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(identifier) => ApiError::Conflict(identifier),
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::InsufficientFunds { .. } => ApiError::InsufficientFunds,
            StoreError::Overflow => {
                ApiError::InvalidInput("delta would overflow the balance".to_string())
            }
            other => {
                tracing::error!(error = %other, "store operation failed");
                ApiError::ServiceUnavailable("storage backend error".to_string())
            }
        }
    }
}
