use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use shopledger_core::Money;
use shopledger_ledger::AdjustBalance;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/balance", post(adjust_balance))
}

pub async fn adjust_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::BalanceRequest>,
) -> axum::response::Response {
    let operation = match dto::parse_operation(&body.operation) {
        Ok(op) => op,
        Err(resp) => return resp,
    };
    let cmd = match AdjustBalance::new(operation, Money::new(body.amount)) {
        Ok(c) => c,
        Err(e) => return errors::transaction_error_to_response(e.into()),
    };

    match services.engine().adjust_balance(cmd).await {
        Ok(applied) => (
            StatusCode::OK,
            Json(dto::write_result_to_json(
                "Balance updated successfully!",
                applied.new_balance,
            )),
        )
            .into_response(),
        Err(e) => errors::transaction_error_to_response(e),
    }
}
