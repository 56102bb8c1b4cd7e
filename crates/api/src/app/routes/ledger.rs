use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/history", get(list_history))
}

/// Current balance plus every inventory row.
pub async fn overview(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let balance = match services.query().current_balance().await {
        Ok(b) => b,
        Err(e) => return errors::store_error_to_response(e),
    };
    let inventory = match services.query().list_inventory().await {
        Ok(items) => items.into_iter().map(dto::inventory_item_to_json).collect::<Vec<_>>(),
        Err(e) => return errors::store_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "balance": balance,
            "inventory": inventory,
        })),
    )
        .into_response()
}

pub async fn list_history(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.query().list_history().await {
        Ok(entries) => {
            let history = entries.into_iter().map(dto::history_entry_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "history": history }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
