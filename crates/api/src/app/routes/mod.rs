use axum::Router;

pub mod balance;
pub mod inventory;
pub mod ledger;
pub mod system;

/// Router for all ledger endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(ledger::router())
        .merge(inventory::router())
        .merge(balance::router())
}
