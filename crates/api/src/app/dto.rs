use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use shopledger_core::Money;
use shopledger_ledger::{BalanceOperation, HistoryEntry, InventoryItem};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /purchase` and `POST /sale`.
#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct BalanceRequest {
    pub operation: String,
    pub amount: Decimal,
}

pub fn parse_operation(s: &str) -> Result<BalanceOperation, axum::response::Response> {
    s.trim().parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "operation must be one of: Debit, Credit",
        )
    })
}

// -------------------------
// Response mapping
// -------------------------

pub fn write_result_to_json(message: &str, balance: Money) -> serde_json::Value {
    serde_json::json!({
        "message": message,
        "balance": balance,
    })
}

pub fn inventory_item_to_json(item: InventoryItem) -> serde_json::Value {
    serde_json::json!({
        "id": item.id,
        "product_name": item.product_name,
        "unit_price": item.unit_price,
        "quantity": item.quantity,
    })
}

pub fn history_entry_to_json(entry: HistoryEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "timestamp": entry.timestamp,
        "transaction_type": entry.transaction_type,
        "description": entry.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopledger_core::RecordId;
    use shopledger_ledger::TransactionKind;

    #[test]
    fn decimals_render_as_strings() {
        let item = InventoryItem {
            id: RecordId::new(3),
            product_name: "Widget".to_string(),
            unit_price: Money::new(Decimal::new(1000, 2)),
            quantity: 5,
        };
        let json = inventory_item_to_json(item);
        assert_eq!(json["unit_price"], "10.00");
        assert_eq!(json["id"], 3);
        assert_eq!(json["quantity"], 5);
    }

    #[test]
    fn history_uses_display_labels() {
        let entry = HistoryEntry {
            id: RecordId::new(1),
            timestamp: Utc::now(),
            transaction_type: TransactionKind::BalanceDebit,
            description: "Debit by 5. Current balance: 15".to_string(),
        };
        let json = history_entry_to_json(entry);
        assert_eq!(json["transaction_type"], "Balance - Debit");
    }

    #[test]
    fn requests_accept_numbers_or_strings_for_decimals() {
        let a: LineItemRequest =
            serde_json::from_str(r#"{"product_name":"Widget","price":"10.50","quantity":2}"#).unwrap();
        let b: LineItemRequest =
            serde_json::from_str(r#"{"product_name":"Widget","price":10.5,"quantity":2}"#).unwrap();
        assert_eq!(a.price, b.price);
    }

    #[test]
    fn operation_labels_are_exact() {
        assert_eq!(parse_operation("Debit").unwrap(), BalanceOperation::Debit);
        assert_eq!(parse_operation(" Credit ").unwrap(), BalanceOperation::Credit);
        assert!(parse_operation("debit").is_err());
    }
}
