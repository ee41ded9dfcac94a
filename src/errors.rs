// ABOUTME: Unified error handling for the nutrition core
// ABOUTME: ErrorCode taxonomy, AppError struct, and convenience constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

//! # Unified Error Handling
//!
//! Centralized error types for the meal-suggestion pipeline. Every failure a
//! caller can observe maps to an [`ErrorCode`]; recoverable conditions
//! (a single unresolved ingredient, one malformed generation attempt) are
//! handled in place and only surface here once recovery is exhausted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// No active user identity; fatal for the session
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,

    // Validation (3000-3999)
    /// Input failed validation
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// Generative output failed schema validation after the bounded retry
    #[serde(rename = "MALFORMED_GENERATION")]
    MalformedGeneration = 3001,

    // Resource (4000-4999)
    /// A composition lookup returned no usable match for one ingredient
    #[serde(rename = "LOOKUP_MISS")]
    LookupMiss = 4000,

    // External services (5000-5999)
    /// An external call errored; retryable
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// An external call exceeded its bounded timeout; retryable
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout = 5001,

    // Configuration (6000-6999)
    /// Configuration missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Storage (9000-9999)
    /// Persistence write failed; the proposal is retained for retry
    #[serde(rename = "PERSISTENCE_ERROR")]
    PersistenceError = 9000,
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9001,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to generate meals",
            Self::InvalidInput => "The provided input is invalid",
            Self::MalformedGeneration => {
                "The generated meal could not be understood after one retry"
            }
            Self::LookupMiss => "No nutrition data was found for an ingredient",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceTimeout => "An external service did not respond in time",
            Self::ConfigError => "Configuration error encountered",
            Self::PersistenceError => "Saving the meal failed; it was kept for retry",
            Self::InternalError => "An internal error occurred",
        }
    }

    /// Whether re-issuing the same operation can reasonably succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalServiceError
                | Self::ExternalServiceTimeout
                | Self::PersistenceError
                | Self::MalformedGeneration
        )
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// User this error occurred for, when known
    pub user_id: Option<Uuid>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            user_id: None,
            source: None,
        }
    }

    /// Attach the user this error occurred for
    #[must_use]
    pub const fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether re-issuing the same operation can reasonably succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors for common errors
impl AppError {
    /// No active user identity
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "No authenticated user")
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Generative output failed schema validation after the bounded retry
    pub fn malformed_generation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedGeneration, message)
    }

    /// Composition lookup found nothing for an ingredient
    pub fn lookup_miss(item: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::LookupMiss,
            format!("no composition match for {:?}", item.into()),
        )
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// External call exceeded its bounded timeout
    pub fn timeout(service: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceTimeout,
            format!("{} request timed out", service.into()),
        )
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Persistence write failed
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceError, message)
    }

    /// Unexpected internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_error_code_retryability() {
        assert!(ErrorCode::ExternalServiceTimeout.is_retryable());
        assert!(ErrorCode::PersistenceError.is_retryable());
        assert!(!ErrorCode::AuthRequired.is_retryable());
        assert!(!ErrorCode::InvalidInput.is_retryable());
    }

    #[test]
    fn test_app_error_display_is_human_readable() {
        let error = AppError::lookup_miss("dragon fruit");
        let rendered = error.to_string();
        assert!(rendered.contains("dragon fruit"));
        assert!(rendered.contains("No nutrition data"));
    }

    #[test]
    fn test_with_source_preserves_the_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no route");
        let error = AppError::external_service("USDA API", "failed to connect").with_source(io);
        let source = std::error::Error::source(&error).unwrap();
        assert!(source.to_string().contains("no route"));
    }

    #[test]
    fn test_with_user_id_attributes_the_error() {
        let user = Uuid::new_v4();
        let error = AppError::persistence("write refused").with_user_id(user);
        assert_eq!(error.user_id, Some(user));
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::MalformedGeneration).unwrap();
        assert_eq!(json, "\"MALFORMED_GENERATION\"");
    }
}
