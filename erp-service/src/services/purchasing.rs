//! Supplier purchases: draft editing and validation, which receives stock
//! and moves each product's weighted-average cost.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::error::{ServiceError, ServiceResult};
use super::ids::{child_id, entity_id, short_suffix};
use super::journal::log_audit;
use super::ledger::{compute_line_totals, ensure_non_negative, round2, round4};
use super::metrics::DOCUMENTS_VALIDATED_TOTAL;
use super::stock::push_movement;
use super::valuation::{apply_receipt, Receipt};
use crate::models::{
    DocumentKind, DocumentTotals, LinePatch, MovementKind, PriceHistoryEntry, Product, Purchase,
    PurchaseLine, PurchaseStatus, StateDocument,
};

fn draft_mut<'a>(doc: &'a mut StateDocument, purchase_id: &str) -> ServiceResult<&'a mut Purchase> {
    let purchase = doc
        .purchase_mut(purchase_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(purchase_id.to_string()))?;
    if !purchase.is_draft() {
        return Err(ServiceError::NotDraft(purchase_id.to_string()));
    }
    Ok(purchase)
}

/// Purchase totals. TVA is derived as TTC minus HT.
pub fn recompute_purchase_totals(lines: &[PurchaseLine]) -> DocumentTotals {
    let (ht, ttc) = lines.iter().fold((Decimal::ZERO, Decimal::ZERO), |(ht, ttc), l| {
        (ht + l.totals.total_excl_tax, ttc + l.totals.total_incl_tax)
    });
    DocumentTotals {
        total_excl_tax: round2(ht),
        total_tax: round2(ttc - ht),
        total_incl_tax: round2(ttc),
    }
}

fn refresh(purchase: &mut Purchase) {
    for line in purchase.lines.iter_mut() {
        line.totals = compute_line_totals(line.quantity, line.unit_cost, line.tva_rate, line.discount);
    }
    purchase.totals = recompute_purchase_totals(&purchase.lines);
}

#[instrument(skip(doc))]
pub fn create_purchase(
    doc: &mut StateDocument,
    supplier_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<String> {
    if !doc.suppliers.iter().any(|s| s.id == supplier_id) {
        return Err(ServiceError::MissingParty("supplier"));
    }
    let id = entity_id("PUR", now, |id| doc.purchases.iter().any(|p| p.id == id));
    doc.purchases.insert(
        0,
        Purchase {
            id: id.clone(),
            status: PurchaseStatus::Draft,
            supplier_id: Some(supplier_id.to_string()),
            date: Some(now.date_naive()),
            lines: Vec::new(),
            totals: DocumentTotals::default(),
            created_at: now,
        },
    );
    log_audit(
        doc,
        user_id,
        "Finance",
        "Purchase Draft",
        format!("Brouillon d'achat créé pour fournisseur {supplier_id}"),
        now,
    );
    Ok(id)
}

/// Adds one unit of a product, costed at the product's current average cost.
pub fn add_purchase_line(
    doc: &mut StateDocument,
    purchase_id: &str,
    product_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<String> {
    let product = doc
        .product(product_id)
        .ok_or_else(|| ServiceError::ProductNotFound(product_id.to_string()))?;
    let line = PurchaseLine {
        id: child_id("PL", now, &short_suffix()),
        product_id: product.id.clone(),
        description: product.name.clone(),
        quantity: Decimal::ONE,
        unit: product.unit.clone(),
        unit_cost: product.cost,
        tva_rate: product.tax_rate,
        discount: Decimal::ZERO,
        totals: Default::default(),
    };
    let line_id = line.id.clone();

    let purchase = draft_mut(doc, purchase_id)?;
    purchase.lines.push(line);
    refresh(purchase);
    Ok(line_id)
}

pub fn update_purchase_line(
    doc: &mut StateDocument,
    purchase_id: &str,
    line_id: &str,
    patch: LinePatch,
) -> ServiceResult<()> {
    for (field, value) in [
        ("quantity", patch.quantity),
        ("unit cost", patch.unit_price),
        ("tax rate", patch.tax_rate),
        ("discount", patch.discount),
    ] {
        if let Some(v) = value {
            ensure_non_negative(field, v)?;
        }
    }
    let purchase = draft_mut(doc, purchase_id)?;
    let line = purchase
        .lines
        .iter_mut()
        .find(|l| l.id == line_id)
        .ok_or_else(|| ServiceError::LineNotFound(line_id.to_string()))?;
    if let Some(q) = patch.quantity {
        line.quantity = q;
    }
    if let Some(c) = patch.unit_price {
        line.unit_cost = c;
    }
    if let Some(t) = patch.tax_rate {
        line.tva_rate = t;
    }
    if let Some(d) = patch.discount {
        line.discount = d;
    }
    if let Some(desc) = patch.description {
        line.description = desc;
    }
    refresh(purchase);
    Ok(())
}

pub fn remove_purchase_line(
    doc: &mut StateDocument,
    purchase_id: &str,
    line_id: &str,
) -> ServiceResult<()> {
    let purchase = draft_mut(doc, purchase_id)?;
    let before = purchase.lines.len();
    purchase.lines.retain(|l| l.id != line_id);
    if purchase.lines.len() == before {
        return Err(ServiceError::LineNotFound(line_id.to_string()));
    }
    refresh(purchase);
    Ok(())
}

#[instrument(skip(doc))]
pub fn delete_purchase_draft(doc: &mut StateDocument, purchase_id: &str) -> ServiceResult<()> {
    draft_mut(doc, purchase_id)?;
    doc.purchases.retain(|p| p.id != purchase_id);
    Ok(())
}

/// Unit cost actually paid on a line: its net HT spread over the quantity, so
/// a line discount lowers the cost basis. A non-positive quantity keeps the
/// list cost and is rejected by the receipt itself.
pub fn net_unit_cost(line: &PurchaseLine) -> Decimal {
    if line.quantity <= Decimal::ZERO {
        return line.unit_cost;
    }
    let totals = compute_line_totals(line.quantity, line.unit_cost, line.tva_rate, line.discount);
    round4(totals.total_excl_tax / line.quantity)
}

/// Runs every receipt against a scratch copy of the affected products so that
/// a bad line fails the whole purchase before anything is written.
fn plan_receipts(doc: &StateDocument, purchase: &Purchase) -> ServiceResult<Vec<Receipt>> {
    let mut scratch: HashMap<&str, Product> = HashMap::new();
    let mut receipts = Vec::with_capacity(purchase.lines.len());
    for line in &purchase.lines {
        let product = match scratch.entry(line.product_id.as_str()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let p = doc
                    .product(&line.product_id)
                    .ok_or_else(|| ServiceError::ProductNotFound(line.product_id.clone()))?;
                entry.insert(p.clone())
            }
        };
        let receipt = apply_receipt(product, line.quantity, net_unit_cost(line))?;
        product.stock_qty = receipt.new_qty;
        product.cost = receipt.new_cost;
        receipts.push(receipt);
    }
    Ok(receipts)
}

/// Receives every line exactly once: stock and average cost are updated, a
/// price-history entry and a `Purchase` movement are appended. Returns the
/// purchase number.
#[instrument(skip(doc))]
pub fn validate_purchase(
    doc: &mut StateDocument,
    purchase_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<String> {
    let purchase = doc
        .purchase(purchase_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(purchase_id.to_string()))?;
    if !purchase.is_draft() {
        return Err(ServiceError::AlreadyValidated(purchase_id.to_string()));
    }
    if purchase.lines.is_empty() {
        return Err(ServiceError::EmptyDocument);
    }
    let supplier_id = purchase
        .supplier_id
        .clone()
        .ok_or(ServiceError::MissingParty("supplier"))?;
    let receipts = plan_receipts(doc, purchase)?;
    let lines = purchase.lines.clone();
    let date = purchase.date.unwrap_or_else(|| now.date_naive());

    let number = doc.settings.issue(DocumentKind::Purchase, now.year());
    for (line, receipt) in lines.iter().zip(&receipts) {
        if let Some(product) = doc.product_mut(&line.product_id) {
            product.stock_qty = receipt.new_qty;
            product.cost = receipt.new_cost;
        }
        doc.purchase_price_history.push(PriceHistoryEntry {
            id: child_id("LOG", now, &line.id),
            product_id: line.product_id.clone(),
            supplier_id: supplier_id.clone(),
            unit_cost: net_unit_cost(line),
            date: Some(date),
            purchase_id: purchase_id.to_string(),
        });
        push_movement(
            doc,
            child_id("MV", now, &line.id),
            &line.product_id,
            MovementKind::Purchase,
            line.quantity,
            &format!("Achat {number}"),
            user_id,
            now,
        );
    }

    if let Some(purchase) = doc.purchase_mut(purchase_id) {
        purchase.status = PurchaseStatus::Validated {
            number: number.clone(),
            validated_at: Some(now),
        };
    }
    log_audit(
        doc,
        user_id,
        "Finance",
        "Purchase Validate",
        format!("Achat {number} validé, stocks et PMP mis à jour."),
        now,
    );
    DOCUMENTS_VALIDATED_TOTAL.with_label_values(&["purchase"]).inc();

    info!(purchase_id = %purchase_id, number = %number, lines = lines.len(), "Purchase validated");
    Ok(number)
}
