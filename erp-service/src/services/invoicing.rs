//! Invoice aggregator: draft editing, validation and cancellation.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::error::{ServiceError, ServiceResult};
use super::ids::{child_id, entity_id, short_suffix};
use super::journal::{log_audit, log_client_action};
use super::ledger::{compute_line_totals, ensure_non_negative, price_excl_tax, sum_totals};
use super::metrics::DOCUMENTS_VALIDATED_TOTAL;
use super::stock::apply_sale_issues;
use crate::config::StockPolicy;
use crate::models::{
    CatalogItem, DocumentKind, DocumentTotals, Invoice, InvoiceLine, InvoiceStatus, InvoiceType,
    ItemType, LinePatch, StateDocument,
};

pub const PAYMENT_TERM_DAYS: i64 = 30;

fn ensure_draft(invoice: &Invoice) -> ServiceResult<()> {
    if invoice.is_draft() {
        Ok(())
    } else {
        Err(ServiceError::NotDraft(invoice.id.clone()))
    }
}

pub fn recompute_invoice_totals(lines: &[InvoiceLine], global_discount: Decimal) -> DocumentTotals {
    sum_totals(lines.iter().map(|l| &l.totals), global_discount)
}

fn refresh_line(line: &mut InvoiceLine) {
    line.totals = compute_line_totals(line.quantity, line.unit_price, line.tva_rate, line.discount);
}

fn refresh_totals(invoice: &mut Invoice) {
    invoice.totals = recompute_invoice_totals(&invoice.lines, invoice.global_discount);
}

/// Appends one unit of a catalog item and returns the new line id.
pub fn add_line(
    draft: &mut Invoice,
    item: CatalogItem<'_>,
    now: DateTime<Utc>,
) -> ServiceResult<String> {
    ensure_draft(draft)?;
    let unit_price = match item {
        CatalogItem::Product(p) => price_excl_tax(p.price, p.tax_rate),
        CatalogItem::Service(s) => s.price_ht,
    };
    let mut line = InvoiceLine {
        id: child_id("L", now, &short_suffix()),
        item_id: item.id().to_string(),
        item_type: item.item_type(),
        description: item.name().to_string(),
        quantity: Decimal::ONE,
        unit: item.unit().to_string(),
        unit_price,
        tva_rate: item.tax_rate(),
        discount: Decimal::ZERO,
        totals: Default::default(),
    };
    refresh_line(&mut line);
    let id = line.id.clone();
    draft.lines.push(line);
    refresh_totals(draft);
    Ok(id)
}

pub fn update_line(draft: &mut Invoice, line_id: &str, patch: LinePatch) -> ServiceResult<()> {
    ensure_draft(draft)?;
    for (field, value) in [
        ("quantity", patch.quantity),
        ("unit price", patch.unit_price),
        ("tax rate", patch.tax_rate),
        ("discount", patch.discount),
    ] {
        if let Some(v) = value {
            ensure_non_negative(field, v)?;
        }
    }

    let line = draft
        .lines
        .iter_mut()
        .find(|l| l.id == line_id)
        .ok_or_else(|| ServiceError::LineNotFound(line_id.to_string()))?;
    if let Some(q) = patch.quantity {
        line.quantity = q;
    }
    if let Some(p) = patch.unit_price {
        line.unit_price = p;
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
    refresh_line(line);
    refresh_totals(draft);
    Ok(())
}

pub fn remove_line(draft: &mut Invoice, line_id: &str) -> ServiceResult<()> {
    ensure_draft(draft)?;
    let before = draft.lines.len();
    draft.lines.retain(|l| l.id != line_id);
    if draft.lines.len() == before {
        return Err(ServiceError::LineNotFound(line_id.to_string()));
    }
    refresh_totals(draft);
    Ok(())
}

pub fn set_global_discount(draft: &mut Invoice, amount: Decimal) -> ServiceResult<()> {
    ensure_draft(draft)?;
    ensure_non_negative("global discount", amount)?;
    draft.global_discount = amount;
    refresh_totals(draft);
    Ok(())
}

/// Creates an empty draft due in thirty days and returns its id.
#[instrument(skip(doc))]
pub fn create_draft(
    doc: &mut StateDocument,
    client_id: Option<&str>,
    user_id: &str,
    kind: InvoiceType,
    now: DateTime<Utc>,
) -> String {
    let id = entity_id("INV", now, |id| doc.invoices.iter().any(|i| i.id == id));
    doc.invoices.insert(
        0,
        Invoice {
            id: id.clone(),
            kind,
            status: InvoiceStatus::Draft,
            client_id: client_id.map(str::to_string),
            user_id: user_id.to_string(),
            lines: Vec::new(),
            totals: DocumentTotals::default(),
            global_discount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            created_at: now,
            due_date: Some((now + Duration::days(PAYMENT_TERM_DAYS)).date_naive()),
        },
    );
    id
}

/// Inserts or replaces a draft. Totals are recomputed from the lines so a
/// stored draft never carries stale totals.
#[instrument(skip(doc, invoice), fields(invoice_id = %invoice.id))]
pub fn save_draft(doc: &mut StateDocument, mut invoice: Invoice) -> ServiceResult<()> {
    ensure_draft(&invoice)?;
    if let Some(client_id) = invoice.client_id.as_deref() {
        if doc.client(client_id).is_none() {
            return Err(ServiceError::InvalidInput(format!("unknown client {client_id}")));
        }
    }
    ensure_non_negative("global discount", invoice.global_discount)?;
    invoice.lines.iter_mut().for_each(refresh_line);
    refresh_totals(&mut invoice);

    match doc.invoices.iter().position(|i| i.id == invoice.id) {
        Some(index) => {
            ensure_draft(&doc.invoices[index])?;
            doc.invoices[index] = invoice;
        }
        None => doc.invoices.insert(0, invoice),
    }
    Ok(())
}

/// Checks every precondition of validation without touching the document.
fn check_validation(
    doc: &StateDocument,
    invoice: &Invoice,
    policy: StockPolicy,
) -> ServiceResult<()> {
    if !invoice.is_draft() {
        return Err(ServiceError::AlreadyValidated(invoice.id.clone()));
    }
    if invoice.lines.is_empty() {
        return Err(ServiceError::EmptyDocument);
    }
    if invoice.client_id.is_none() {
        return Err(ServiceError::MissingParty("client"));
    }
    for line in invoice.lines.iter().filter(|l| l.item_type == ItemType::Product) {
        let product = doc
            .product(&line.item_id)
            .ok_or_else(|| ServiceError::ProductNotFound(line.item_id.clone()))?;
        if policy == StockPolicy::Strict {
            // Several lines may draw on the same product.
            let requested: Decimal = invoice
                .lines
                .iter()
                .filter(|l| l.item_type == ItemType::Product && l.item_id == line.item_id)
                .map(|l| l.quantity)
                .sum();
            if requested > product.stock_qty {
                return Err(ServiceError::InsufficientStock {
                    product_id: product.id.clone(),
                    available: product.stock_qty,
                    requested,
                });
            }
        }
    }
    Ok(())
}

/// Assigns the next invoice number, freezes the invoice and issues stock for
/// its product lines. Returns the number.
#[instrument(skip(doc, policy))]
pub fn validate_invoice(
    doc: &mut StateDocument,
    invoice_id: &str,
    now: DateTime<Utc>,
    policy: StockPolicy,
) -> ServiceResult<String> {
    let invoice = doc
        .invoice(invoice_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(invoice_id.to_string()))?;
    check_validation(doc, invoice, policy)?;

    let issues: Vec<(String, Decimal)> = invoice
        .lines
        .iter()
        .filter(|l| l.item_type == ItemType::Product)
        .map(|l| (l.item_id.clone(), l.quantity))
        .collect();
    let user_id = invoice.user_id.clone();
    let client_id = invoice.client_id.clone().unwrap_or_default();

    let number = doc.settings.issue(DocumentKind::Invoice, now.year());
    let invoice = doc
        .invoice_mut(invoice_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(invoice_id.to_string()))?;
    invoice.status = InvoiceStatus::Validated {
        number: number.clone(),
        validated_at: now,
    };
    let total = invoice.totals.total_incl_tax;

    let reason = format!("Facture {number}");
    for product_id in apply_sale_issues(doc, &issues, &reason, &user_id, invoice_id, now) {
        warn!(product_id = %product_id, invoice_id = %invoice_id, "Stock went negative after invoice validation");
    }

    log_client_action(
        doc,
        &client_id,
        &user_id,
        "Sale",
        format!("Facture validée : {number}"),
        Some(total),
        now,
    );
    log_audit(doc, &user_id, "Billing", "Validate", format!("Facture {number} validée."), now);
    DOCUMENTS_VALIDATED_TOTAL.with_label_values(&["invoice"]).inc();

    info!(invoice_id = %invoice_id, number = %number, total = %total, "Invoice validated");
    Ok(number)
}

/// Cancels a validated invoice. Stock is not restored.
#[instrument(skip(doc, reason))]
pub fn cancel_invoice(
    doc: &mut StateDocument,
    invoice_id: &str,
    reason: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ServiceError::MissingReason);
    }
    let invoice = doc
        .invoice_mut(invoice_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(invoice_id.to_string()))?;
    let (number, validated_at) = match &invoice.status {
        InvoiceStatus::Validated {
            number,
            validated_at,
        } => (number.clone(), *validated_at),
        other => {
            return Err(ServiceError::InvalidTransition {
                from: other.as_str(),
                to: "cancelled",
            })
        }
    };
    invoice.status = InvoiceStatus::Cancelled {
        number: number.clone(),
        validated_at,
        cancelled_at: Some(now),
        cancellation_reason: reason.to_string(),
    };

    log_audit(
        doc,
        user_id,
        "Billing",
        "Cancel",
        format!("Facture {number} annulée. Motif: {reason}"),
        now,
    );
    info!(invoice_id = %invoice_id, number = %number, "Invoice cancelled");
    Ok(())
}

/// Removes a draft. Validated and cancelled invoices are never deleted.
#[instrument(skip(doc))]
pub fn delete_draft(doc: &mut StateDocument, invoice_id: &str) -> ServiceResult<()> {
    let index = doc
        .invoices
        .iter()
        .position(|i| i.id == invoice_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(invoice_id.to_string()))?;
    ensure_draft(&doc.invoices[index])?;
    doc.invoices.remove(index);
    Ok(())
}
