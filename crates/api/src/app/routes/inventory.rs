use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use shopledger_core::Money;
use shopledger_ledger::{Purchase, Sale};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/purchase", post(record_purchase))
        .route("/sale", post(record_sale))
}

pub async fn record_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LineItemRequest>,
) -> axum::response::Response {
    let cmd = match Purchase::new(&body.product_name, Money::new(body.price), body.quantity) {
        Ok(c) => c,
        Err(e) => return errors::transaction_error_to_response(e.into()),
    };

    match services.engine().purchase(cmd).await {
        Ok(applied) => (
            StatusCode::OK,
            Json(dto::write_result_to_json(
                "Purchase recorded successfully!",
                applied.new_balance,
            )),
        )
            .into_response(),
        Err(e) => errors::transaction_error_to_response(e),
    }
}

pub async fn record_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LineItemRequest>,
) -> axum::response::Response {
    let cmd = match Sale::new(&body.product_name, Money::new(body.price), body.quantity) {
        Ok(c) => c,
        Err(e) => return errors::transaction_error_to_response(e.into()),
    };

    match services.engine().sale(cmd).await {
        Ok(applied) => (
            StatusCode::OK,
            Json(dto::write_result_to_json("Sale recorded successfully!", applied.new_balance)),
        )
            .into_response(),
        Err(e) => errors::transaction_error_to_response(e),
    }
}
