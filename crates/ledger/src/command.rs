//! Validated ledger commands.
//!
//! Constructors re-check every precondition so an invalid command can never
//! reach the decision logic, whatever the caller validated before.

use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, Money};

use crate::balance::BalanceOperation;

/// Longest product name the inventory table accepts.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

fn validate_line(product_name: &str, unit_price: Money, quantity: i64) -> DomainResult<String> {
    let name = product_name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("product_name cannot be empty"));
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(DomainError::validation(format!(
            "product_name cannot exceed {MAX_PRODUCT_NAME_LEN} characters"
        )));
    }
    if !unit_price.is_positive() {
        return Err(DomainError::validation("price must be positive"));
    }
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(name.to_string())
}

/// Wire shape of a purchase or sale; deserialization goes through the constructors.
#[derive(Debug, Deserialize)]
struct LineFields {
    product_name: String,
    unit_price: Money,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct AdjustmentFields {
    operation: BalanceOperation,
    amount: Money,
}

/// Command: buy `quantity` units of a product, paying from the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineFields")]
pub struct Purchase {
    product_name: String,
    unit_price: Money,
    quantity: i64,
}

impl Purchase {
    pub fn new(product_name: &str, unit_price: Money, quantity: i64) -> DomainResult<Self> {
        let product_name = validate_line(product_name, unit_price, quantity)?;
        Ok(Self {
            product_name,
            unit_price,
            quantity,
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn total(&self) -> DomainResult<Money> {
        self.unit_price.times(self.quantity)
    }

    /// Re-run the constructor checks.
    pub fn validate(&self) -> DomainResult<()> {
        validate_line(&self.product_name, self.unit_price, self.quantity).map(|_| ())
    }
}

impl TryFrom<LineFields> for Purchase {
    type Error = DomainError;

    fn try_from(fields: LineFields) -> Result<Self, Self::Error> {
        Self::new(&fields.product_name, fields.unit_price, fields.quantity)
    }
}

/// Command: sell `quantity` units of a stocked product into the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineFields")]
pub struct Sale {
    product_name: String,
    unit_price: Money,
    quantity: i64,
}

impl Sale {
    pub fn new(product_name: &str, unit_price: Money, quantity: i64) -> DomainResult<Self> {
        let product_name = validate_line(product_name, unit_price, quantity)?;
        Ok(Self {
            product_name,
            unit_price,
            quantity,
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn total(&self) -> DomainResult<Money> {
        self.unit_price.times(self.quantity)
    }

    /// Re-run the constructor checks.
    pub fn validate(&self) -> DomainResult<()> {
        validate_line(&self.product_name, self.unit_price, self.quantity).map(|_| ())
    }
}

impl TryFrom<LineFields> for Sale {
    type Error = DomainError;

    fn try_from(fields: LineFields) -> Result<Self, Self::Error> {
        Self::new(&fields.product_name, fields.unit_price, fields.quantity)
    }
}

/// Command: move the balance up (`Debit`) or down (`Credit`) by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AdjustmentFields")]
pub struct AdjustBalance {
    operation: BalanceOperation,
    amount: Money,
}

impl AdjustBalance {
    pub fn new(operation: BalanceOperation, amount: Money) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::validation("amount must be positive"));
        }
        Ok(Self { operation, amount })
    }

    pub fn operation(&self) -> BalanceOperation {
        self.operation
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn validate(&self) -> DomainResult<()> {
        Self::new(self.operation, self.amount).map(|_| ())
    }
}

impl TryFrom<AdjustmentFields> for AdjustBalance {
    type Error = DomainError;

    fn try_from(fields: AdjustmentFields) -> Result<Self, Self::Error> {
        Self::new(fields.operation, fields.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    Purchase(Purchase),
    Sale(Sale),
    AdjustBalance(AdjustBalance),
}

impl LedgerCommand {
    /// Inventory key the command touches, if any.
    pub fn product_name(&self) -> Option<&str> {
        match self {
            LedgerCommand::Purchase(cmd) => Some(cmd.product_name()),
            LedgerCommand::Sale(cmd) => Some(cmd.product_name()),
            LedgerCommand::AdjustBalance(_) => None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        match self {
            LedgerCommand::Purchase(cmd) => cmd.validate(),
            LedgerCommand::Sale(cmd) => cmd.validate(),
            LedgerCommand::AdjustBalance(cmd) => cmd.validate(),
        }
    }
}

impl From<Purchase> for LedgerCommand {
    fn from(value: Purchase) -> Self {
        LedgerCommand::Purchase(value)
    }
}

impl From<Sale> for LedgerCommand {
    fn from(value: Sale) -> Self {
        LedgerCommand::Sale(value)
    }
}

impl From<AdjustBalance> for LedgerCommand {
    fn from(value: AdjustBalance) -> Self {
        LedgerCommand::AdjustBalance(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price(v: rust_decimal::Decimal) -> Money {
        Money::new(v)
    }

    #[test]
    fn purchase_trims_product_name() {
        let cmd = Purchase::new("  Widget ", price(dec!(10.00)), 5).unwrap();
        assert_eq!(cmd.product_name(), "Widget");
        assert_eq!(cmd.total().unwrap(), price(dec!(50.00)));
    }

    #[test]
    fn blank_product_name_is_rejected() {
        let err = Sale::new("   ", price(dec!(1)), 1).unwrap_err();
        assert_eq!(err, DomainError::validation("product_name cannot be empty"));
    }

    #[test]
    fn overlong_product_name_is_rejected() {
        let name = "x".repeat(MAX_PRODUCT_NAME_LEN + 1);
        assert!(Purchase::new(&name, price(dec!(1)), 1).is_err());
        let name = "x".repeat(MAX_PRODUCT_NAME_LEN);
        assert!(Purchase::new(&name, price(dec!(1)), 1).is_ok());
    }

    #[test]
    fn non_positive_price_or_quantity_is_rejected() {
        assert!(Purchase::new("Widget", price(dec!(0)), 1).is_err());
        assert!(Purchase::new("Widget", price(dec!(-1)), 1).is_err());
        assert!(Sale::new("Widget", price(dec!(1)), 0).is_err());
        assert!(Sale::new("Widget", price(dec!(1)), -3).is_err());
    }

    #[test]
    fn adjustment_amount_must_be_positive() {
        assert!(AdjustBalance::new(BalanceOperation::Debit, price(dec!(0))).is_err());
        assert!(AdjustBalance::new(BalanceOperation::Credit, price(dec!(-5))).is_err());
        let cmd = AdjustBalance::new(BalanceOperation::Credit, price(dec!(100.00))).unwrap();
        assert_eq!(cmd.operation(), BalanceOperation::Credit);
    }

    #[test]
    fn deserialization_runs_constructor_checks() {
        let err = serde_json::from_str::<Purchase>(r#"{"product_name":"","unit_price":"-10","quantity":3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("product_name cannot be empty"));

        assert!(serde_json::from_str::<Sale>(r#"{"product_name":"Widget","unit_price":"-1","quantity":1}"#).is_err());
        assert!(serde_json::from_str::<AdjustBalance>(r#"{"operation":"Credit","amount":"-5"}"#).is_err());
        assert!(serde_json::from_str::<LedgerCommand>(
            r#"{"Purchase":{"product_name":"Widget","unit_price":"1","quantity":0}}"#
        )
        .is_err());
    }

    #[test]
    fn valid_commands_survive_serde() {
        let cmd: LedgerCommand = Purchase::new(" Widget ", price(dec!(10.00)), 5).unwrap().into();
        let json = serde_json::to_string(&cmd).unwrap();
        let back: LedgerCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
        assert_eq!(back.product_name(), Some("Widget"));
        assert!(back.validate().is_ok());
    }
}
