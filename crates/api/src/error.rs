//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use order_store::StoreError;
use saga::{CapabilityError, SagaError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Saga rejection or abort.
    Saga(SagaError),
    /// Order store error.
    Store(StoreError),
    /// Payment or inventory error.
    Capability(CapabilityError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Capability(err) => capability_error_to_response(err),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::IllegalTransition { .. } => StatusCode::CONFLICT,
        OrderError::CustomerIdRequired
        | OrderError::ProductIdRequired
        | OrderError::InvalidQuantity { .. }
        | OrderError::InvalidAmount { .. }
        | OrderError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    let status = match &err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::AlreadyExists(_) | StoreError::StatusConflict { .. } => StatusCode::CONFLICT,
        StoreError::Domain(order_err) => order_error_status(order_err),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match err {
        SagaError::Store(store_err) => store_error_to_response(store_err),
        err => {
            let status = match &err {
                SagaError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                SagaError::OrderNotReady { .. }
                | SagaError::LockBusy(_)
                | SagaError::IllegalTransition(_) => StatusCode::CONFLICT,
                SagaError::InvalidOrder(order_err) => order_error_status(order_err),
                SagaError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, err.to_string())
        }
    }
}

fn capability_error_to_response(err: CapabilityError) -> (StatusCode, String) {
    let status = match &err {
        CapabilityError::NotFound { .. } => StatusCode::NOT_FOUND,
        CapabilityError::Declined(_) | CapabilityError::InsufficientStock { .. } => {
            StatusCode::CONFLICT
        }
        CapabilityError::Transport(_) | CapabilityError::Timeout(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<CapabilityError> for ApiError {
    fn from(err: CapabilityError) -> Self {
        ApiError::Capability(err)
    }
}
