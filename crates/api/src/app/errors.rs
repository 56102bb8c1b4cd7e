use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopledger_infra::{StoreError, TransactionError};
use shopledger_ledger::Rejection;

pub fn transaction_error_to_response(err: TransactionError) -> axum::response::Response {
    match err {
        TransactionError::Rejected(rejection) => rejection_to_response(rejection),
        TransactionError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        TransactionError::EmptyLedger => store_error_to_response(StoreError::EmptyLedger),
        TransactionError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        TransactionError::Store(e) => store_error_to_response(e),
    }
}

fn rejection_to_response(rejection: Rejection) -> axum::response::Response {
    let message = rejection.to_string();
    match rejection {
        Rejection::InsufficientFunds { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds", message)
        }
        Rejection::ProductNotFound(_) => json_error(StatusCode::NOT_FOUND, "product_not_found", message),
        Rejection::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", message)
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::EmptyLedger => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "empty_ledger",
            StoreError::EmptyLedger.to_string(),
        ),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        e => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            format!("{e:?}"),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
