//! Weighted-average cost (PMP) of stock-tracked products.

use rust_decimal::Decimal;

use super::error::{ServiceError, ServiceResult};
use super::ledger::round4;
use crate::models::Product;

/// Quantity and cost of a product after a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub new_qty: Decimal,
    pub new_cost: Decimal,
}

/// Blends a receipt into the product's average cost. The product itself is
/// not modified.
///
/// A negative on-hand quantity carries no value into the blend: the incoming
/// units are valued at their own cost.
pub fn apply_receipt(
    product: &Product,
    received_qty: Decimal,
    received_unit_cost: Decimal,
) -> ServiceResult<Receipt> {
    if received_qty <= Decimal::ZERO {
        return Err(ServiceError::InvalidInput(format!(
            "received quantity must be positive (got {received_qty})"
        )));
    }
    if received_unit_cost < Decimal::ZERO {
        return Err(ServiceError::InvalidInput(format!(
            "unit cost must not be negative (got {received_unit_cost})"
        )));
    }

    let existing_qty = product.stock_qty;
    let new_qty = existing_qty + received_qty;
    let (valued_qty, existing_value) = if existing_qty > Decimal::ZERO {
        (existing_qty, existing_qty * product.cost)
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    let incoming_value = received_qty * received_unit_cost;
    let blended_qty = valued_qty + received_qty;

    let new_cost = if blended_qty > Decimal::ZERO {
        round4((existing_value + incoming_value) / blended_qty)
    } else {
        received_unit_cost
    };
    Ok(Receipt { new_qty, new_cost })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dec, product};

    fn stocked(qty: &str, cost: &str) -> Product {
        let mut p = product("p1", "200", qty);
        p.cost = dec(cost);
        p
    }

    #[test]
    fn test_blend() {
        let receipt = apply_receipt(&stocked("10", "100"), dec("5"), dec("130")).unwrap();
        assert_eq!(receipt.new_qty, dec("15"));
        assert_eq!(receipt.new_cost, dec("110"));
    }

    #[test]
    fn test_blend_rounds_to_four_places() {
        let receipt = apply_receipt(&stocked("2", "10"), dec("1"), dec("11")).unwrap();
        assert_eq!(receipt.new_cost, dec("10.3333"));
    }

    #[test]
    fn test_empty_stock_takes_incoming_cost() {
        let receipt = apply_receipt(&stocked("0", "0"), dec("4"), dec("12.5")).unwrap();
        assert_eq!(receipt.new_qty, dec("4"));
        assert_eq!(receipt.new_cost, dec("12.5"));
    }

    #[test]
    fn test_negative_stock_contributes_no_value() {
        let receipt = apply_receipt(&stocked("-3", "50"), dec("5"), dec("20")).unwrap();
        assert_eq!(receipt.new_qty, dec("2"));
        assert_eq!(receipt.new_cost, dec("20"));
    }

    #[test]
    fn test_invalid_receipts() {
        let p = stocked("1", "1");
        assert!(apply_receipt(&p, dec("0"), dec("1")).is_err());
        assert!(apply_receipt(&p, dec("1"), dec("-1")).is_err());
    }
}
