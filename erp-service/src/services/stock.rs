//! Stock operations: manual movements, issues for sales and stock reports.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::error::{ServiceError, ServiceResult};
use super::ids::{child_id, entity_id};
use super::journal::log_audit;
use super::ledger::{ensure_non_negative, round2};
use super::metrics::STOCK_MOVEMENTS_TOTAL;
use crate::models::{MovementKind, Product, StateDocument, StockMovement};

#[allow(clippy::too_many_arguments)]
pub(crate) fn push_movement(
    doc: &mut StateDocument,
    id: String,
    product_id: &str,
    kind: MovementKind,
    quantity: Decimal,
    reason: &str,
    user_id: &str,
    now: DateTime<Utc>,
) {
    doc.stock_movements.insert(
        0,
        StockMovement {
            id,
            product_id: product_id.to_string(),
            kind,
            quantity,
            reason: reason.to_string(),
            user_id: user_id.to_string(),
            created_at: now,
        },
    );
    STOCK_MOVEMENTS_TOTAL.with_label_values(&[kind.as_str()]).inc();
}

/// Decrements stock for each `(product_id, quantity)` and records one `Sale`
/// movement per entry. Returns the products whose stock went negative.
///
/// Callers check that every product exists beforehand; unknown ids are skipped.
pub(crate) fn apply_sale_issues(
    doc: &mut StateDocument,
    issues: &[(String, Decimal)],
    reason: &str,
    user_id: &str,
    source_id: &str,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut negative = Vec::new();
    for (n, (product_id, quantity)) in issues.iter().enumerate() {
        let Some(product) = doc.product_mut(product_id) else {
            continue;
        };
        product.stock_qty -= *quantity;
        if product.stock_qty < Decimal::ZERO && !negative.contains(product_id) {
            negative.push(product_id.clone());
        }
        let id = child_id("MV", now, &format!("{source_id}-{}", n + 1));
        push_movement(doc, id, product_id, MovementKind::Sale, *quantity, reason, user_id, now);
    }
    negative
}

/// Records a manual movement. `In` adds, `Out` subtracts and may not take the
/// stock below zero, `Adjustment` sets the on-hand quantity. Returns the new
/// quantity.
#[instrument(skip(doc, reason))]
pub fn record_movement(
    doc: &mut StateDocument,
    product_id: &str,
    kind: MovementKind,
    quantity: Decimal,
    reason: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<Decimal> {
    ensure_non_negative("quantity", quantity)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ServiceError::MissingReason);
    }
    let product = doc
        .product(product_id)
        .ok_or_else(|| ServiceError::ProductNotFound(product_id.to_string()))?;
    let new_qty = match kind {
        MovementKind::In => product.stock_qty + quantity,
        MovementKind::Out => {
            if quantity > product.stock_qty {
                return Err(ServiceError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available: product.stock_qty,
                    requested: quantity,
                });
            }
            product.stock_qty - quantity
        }
        MovementKind::Adjustment => quantity,
        MovementKind::Purchase | MovementKind::Sale => {
            return Err(ServiceError::InvalidInput(format!(
                "{} movements are recorded by document validation",
                kind.as_str()
            )))
        }
    };
    let name = product.name.clone();

    if let Some(product) = doc.product_mut(product_id) {
        product.stock_qty = new_qty;
    }
    let id = entity_id("MOV", now, |id| doc.stock_movements.iter().any(|m| m.id == id));
    push_movement(doc, id, product_id, kind, quantity, reason, user_id, now);
    log_audit(
        doc,
        user_id,
        "Stock",
        "Adjustment",
        format!("Ajustement manuel: {} pour {name}", kind.as_str()),
        now,
    );

    info!(product_id = %product_id, kind = kind.as_str(), new_qty = %new_qty, "Stock movement recorded");
    Ok(new_qty)
}

/// Products at or below their alert threshold.
pub fn low_stock(doc: &StateDocument) -> Vec<&Product> {
    doc.products.iter().filter(|p| p.is_low_stock()).collect()
}

/// Value of the stock on hand at weighted-average cost. Negative quantities
/// are ignored.
pub fn stock_value(doc: &StateDocument) -> Decimal {
    round2(
        doc.products
            .iter()
            .filter(|p| p.stock_qty > Decimal::ZERO)
            .map(|p| p.stock_qty * p.cost)
            .sum(),
    )
}
