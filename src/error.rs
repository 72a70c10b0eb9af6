use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::CartError,
    response::{ApiResponse, Meta},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Cart store error")]
    Cart(#[from] CartError),

    #[error("ORM error")]
    OrmError(#[from] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// Every way an order commit can fail. Each variant maps to a stable result code.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(String),

    #[error("address not found")]
    AddressNotFound,

    #[error("sku {0} does not exist")]
    SkuNotFound(Uuid),

    #[error("insufficient stock for sku {sku_id}: requested {requested}, available {available}")]
    InsufficientStock {
        sku_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("timed out waiting for inventory, please retry")]
    ContentionTimeout,

    #[error("order creation failed")]
    OrderCreationFailed(#[source] anyhow::Error),
}

impl CheckoutError {
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "VALIDATION_ERROR",
            CheckoutError::AddressNotFound => "NOT_FOUND",
            CheckoutError::SkuNotFound(_) => "SKU_NOT_FOUND",
            CheckoutError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CheckoutError::ContentionTimeout => "CONTENTION_TIMEOUT",
            CheckoutError::OrderCreationFailed(_) => "ORDER_CREATION_FAILED",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::ContentionTimeout)
    }

    fn status(&self) -> StatusCode {
        match self {
            CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutError::AddressNotFound | CheckoutError::SkuNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::InsufficientStock { .. } => StatusCode::CONFLICT,
            CheckoutError::ContentionTimeout => StatusCode::SERVICE_UNAVAILABLE,
            CheckoutError::OrderCreationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbErr> for CheckoutError {
    fn from(err: DbErr) -> Self {
        if is_lock_contention(&err) {
            CheckoutError::ContentionTimeout
        } else {
            CheckoutError::OrderCreationFailed(err.into())
        }
    }
}

impl From<CartError> for CheckoutError {
    fn from(err: CartError) -> Self {
        CheckoutError::OrderCreationFailed(err.into())
    }
}

// 55P03 lock_not_available (lock_timeout hit), 40P01 deadlock_detected.
const CONTENTION_SQLSTATES: [&str; 2] = ["55P03", "40P01"];

/// True when Postgres aborted the statement because a row lock could not be acquired in time.
pub fn is_lock_contention(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Query(runtime) | DbErr::Exec(runtime) => runtime,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => db_err
            .code()
            .is_some_and(|code| CONTENTION_SQLSTATES.contains(&&*code)),
        _ => false,
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, retryable) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, Some("NOT_FOUND"), false),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, Some("VALIDATION_ERROR"), false),
            AppError::Forbidden => (StatusCode::FORBIDDEN, None, false),
            AppError::Conflict(_) => (StatusCode::CONFLICT, None, false),
            AppError::Checkout(err) => (err.status(), Some(err.code()), err.is_retryable()),
            AppError::Cart(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None, false),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                code,
                retryable,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_errors_map_to_stable_codes() {
        let sku = Uuid::new_v4();
        assert_eq!(CheckoutError::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(CheckoutError::AddressNotFound.code(), "NOT_FOUND");
        assert_eq!(CheckoutError::SkuNotFound(sku).code(), "SKU_NOT_FOUND");
        assert_eq!(
            CheckoutError::InsufficientStock {
                sku_id: sku,
                requested: 3,
                available: 0
            }
            .code(),
            "INSUFFICIENT_STOCK"
        );
        assert_eq!(CheckoutError::ContentionTimeout.code(), "CONTENTION_TIMEOUT");
        assert!(CheckoutError::ContentionTimeout.is_retryable());
        assert!(!CheckoutError::SkuNotFound(sku).is_retryable());
    }

    #[test]
    fn non_database_errors_are_not_contention() {
        assert!(!is_lock_contention(&DbErr::RecordNotFound("sku".into())));
        assert!(!is_lock_contention(&DbErr::Custom("boom".into())));
    }

    #[test]
    fn unexpected_db_errors_become_order_creation_failures() {
        let err: CheckoutError = DbErr::Custom("disk full".into()).into();
        assert_eq!(err.code(), "ORDER_CREATION_FAILED");
    }

    #[test]
    fn insufficient_stock_responds_with_conflict() {
        let response = AppError::from(CheckoutError::InsufficientStock {
            sku_id: Uuid::new_v4(),
            requested: 2,
            available: 1,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn contention_responds_with_service_unavailable() {
        let response = AppError::from(CheckoutError::ContentionTimeout).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
