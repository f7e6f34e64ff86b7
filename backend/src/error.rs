//! Error handling for the Grain Manager service
//!
//! Every rejection carries enough context (ids, computed amounts) to
//! explain itself to the caller; nothing is silently swallowed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock in warehouse {warehouse_id}: available {available}, requested {requested}")]
    InsufficientStock {
        warehouse_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Payment of {requested} on transaction {transaction_id} exceeds outstanding {outstanding}")]
    Overpayment {
        transaction_id: Uuid,
        requested: Decimal,
        outstanding: Decimal,
    },

    #[error("Dispatch {dispatch_id} payments and deductions of {applied} exceed gross freight {gross_freight}")]
    FreightOverrun {
        dispatch_id: Uuid,
        gross_freight: Decimal,
        applied: Decimal,
    },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InsufficientStock {
                warehouse_id,
                available,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: format!(
                        "Warehouse {} holds {} quintals, requested {}",
                        warehouse_id, available, requested
                    ),
                    field: None,
                },
            ),
            AppError::Overpayment {
                transaction_id,
                requested,
                outstanding,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "OVERPAYMENT".to_string(),
                    message: format!(
                        "Payment of {} exceeds outstanding balance {} on transaction {}",
                        requested, outstanding, transaction_id
                    ),
                    field: None,
                },
            ),
            AppError::FreightOverrun {
                dispatch_id,
                gross_freight,
                applied,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "FREIGHT_OVERRUN".to_string(),
                    message: format!(
                        "Payments and deductions of {} exceed gross freight {} on dispatch {}",
                        applied, gross_freight, dispatch_id
                    ),
                    field: None,
                },
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for a validation rejection on a named field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
