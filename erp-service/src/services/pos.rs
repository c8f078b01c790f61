//! Point of sale: cart arithmetic, role discount ceilings and checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::error::{ServiceError, ServiceResult};
use super::ids::ticket_id;
use super::journal::{log_audit, log_client_action};
use super::ledger::{compute_line_totals, ensure_non_negative, price_excl_tax, round2};
use super::metrics::DOCUMENTS_VALIDATED_TOTAL;
use super::stock::apply_sale_issues;
use crate::models::{
    DocumentTotals, PaymentMode, Product, Role, Sale, SaleItem, StateDocument, WALK_IN_CLIENT_ID,
};

/// Largest total discount a role may grant, in percent of the gross amount.
pub fn discount_limit_percent(role: Role) -> Decimal {
    match role {
        Role::Admin => Decimal::ONE_HUNDRED,
        Role::Manager => Decimal::from(25),
        Role::Seller => Decimal::TEN,
        Role::Technician | Role::Driver => Decimal::ZERO,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<SaleItem>,
    global_discount: Decimal,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn global_discount(&self) -> Decimal {
        self.global_discount
    }

    /// Adds one unit, or bumps the quantity when the product is already in the
    /// cart. Out-of-stock products are refused.
    pub fn add_product(&mut self, product: &Product) -> ServiceResult<()> {
        if product.stock_qty <= Decimal::ZERO {
            return Err(ServiceError::InsufficientStock {
                product_id: product.id.clone(),
                available: product.stock_qty,
                requested: Decimal::ONE,
            });
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            item.quantity += Decimal::ONE;
            return Ok(());
        }
        let unit_price = price_excl_tax(product.price, product.tax_rate);
        self.items.push(SaleItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: Decimal::ONE,
            catalog_price: unit_price,
            unit_price,
            discount: Decimal::ZERO,
            tax_rate: product.tax_rate,
        });
        Ok(())
    }

    /// Zero removes the item.
    pub fn set_quantity(&mut self, product_id: &str, quantity: Decimal) -> ServiceResult<()> {
        ensure_non_negative("quantity", quantity)?;
        let index = self.position(product_id)?;
        if quantity.is_zero() {
            self.items.remove(index);
        } else {
            self.items[index].quantity = quantity;
        }
        Ok(())
    }

    pub fn set_item_discount(&mut self, product_id: &str, discount: Decimal) -> ServiceResult<()> {
        ensure_non_negative("discount", discount)?;
        let index = self.position(product_id)?;
        self.items[index].discount = discount;
        Ok(())
    }

    /// Negotiated unit price, tax excluded. The catalog price is kept so that a
    /// price cut counts against the role's discount ceiling.
    pub fn set_unit_price(&mut self, product_id: &str, unit_price: Decimal) -> ServiceResult<()> {
        ensure_non_negative("unit price", unit_price)?;
        let index = self.position(product_id)?;
        self.items[index].unit_price = unit_price;
        Ok(())
    }

    pub fn set_global_discount(&mut self, discount: Decimal) -> ServiceResult<()> {
        ensure_non_negative("global discount", discount)?;
        self.global_discount = discount;
        Ok(())
    }

    fn position(&self, product_id: &str) -> ServiceResult<usize> {
        self.items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or_else(|| ServiceError::LineNotFound(product_id.to_string()))
    }

    fn line_excl_tax(item: &SaleItem) -> Decimal {
        compute_line_totals(item.quantity, item.unit_price, item.tax_rate, item.discount).total_excl_tax
    }

    /// Gross amount before any discount, tax excluded.
    pub fn gross(&self) -> Decimal {
        round2(self.items.iter().map(|i| i.quantity * i.unit_price).sum())
    }

    /// Ticket totals. The global discount is spread over the items in
    /// proportion to their net amount so that tax follows the discount.
    pub fn totals(&self) -> DocumentTotals {
        let lines: Vec<Decimal> = self.items.iter().map(Self::line_excl_tax).collect();
        let net: Decimal = lines.iter().copied().sum();
        let total_excl_tax = round2((net - self.global_discount).max(Decimal::ZERO));

        let total_tax: Decimal = self
            .items
            .iter()
            .zip(&lines)
            .map(|(item, line)| {
                let share = if net > Decimal::ZERO {
                    self.global_discount * *line / net
                } else {
                    Decimal::ZERO
                };
                (*line - share).max(Decimal::ZERO) * item.tax_rate / Decimal::ONE_HUNDRED
            })
            .sum();
        let total_tax = round2(total_tax);

        DocumentTotals {
            total_excl_tax,
            total_tax,
            total_incl_tax: round2(total_excl_tax + total_tax),
        }
    }

    /// Sum of item discounts, global discount and price reductions below the
    /// catalog price.
    pub fn total_discount(&self) -> Decimal {
        let reductions: Decimal = self
            .items
            .iter()
            .map(|i| (i.catalog_price - i.unit_price).max(Decimal::ZERO) * i.quantity + i.discount)
            .sum();
        reductions + self.global_discount
    }

    pub fn check_discount(&self, role: Role) -> ServiceResult<()> {
        let limit_percent = discount_limit_percent(role);
        let catalog_gross: Decimal = self.items.iter().map(|i| i.quantity * i.catalog_price).sum();
        let allowed = catalog_gross * limit_percent / Decimal::ONE_HUNDRED;
        let requested = self.total_discount();
        if requested > allowed {
            return Err(ServiceError::DiscountLimitExceeded {
                role: role.to_string(),
                requested: round2(requested),
                limit_percent,
            });
        }
        Ok(())
    }
}

/// Books a counter sale against the walk-in client and returns the ticket.
#[instrument(skip(doc, cart), fields(items = cart.items.len()))]
pub fn checkout(
    doc: &mut StateDocument,
    cart: Cart,
    payment_mode: PaymentMode,
    user_id: &str,
    role: Role,
    now: DateTime<Utc>,
) -> ServiceResult<Sale> {
    if cart.is_empty() {
        return Err(ServiceError::EmptyDocument);
    }
    cart.check_discount(role)?;
    if let Some(item) = cart.items.iter().find(|i| doc.product(&i.product_id).is_none()) {
        return Err(ServiceError::ProductNotFound(item.product_id.clone()));
    }

    let totals = cart.totals();
    let id = ticket_id(now, |id| doc.sales.iter().any(|s| s.id == id));
    let sale = Sale {
        id: id.clone(),
        user_id: user_id.to_string(),
        global_discount: cart.global_discount,
        total_excl_tax: totals.total_excl_tax,
        total_tax: totals.total_tax,
        total_incl_tax: totals.total_incl_tax,
        payment_mode,
        status: "Paid".to_string(),
        created_at: now,
        items: cart.items,
    };

    let issues: Vec<(String, Decimal)> = sale
        .items
        .iter()
        .map(|i| (i.product_id.clone(), i.quantity))
        .collect();
    for product_id in apply_sale_issues(doc, &issues, &format!("Ticket {id}"), user_id, &id, now) {
        warn!(product_id = %product_id, ticket_id = %id, "Stock went negative after counter sale");
    }
    doc.sales.insert(0, sale.clone());

    log_client_action(
        doc,
        WALK_IN_CLIENT_ID,
        user_id,
        "Sale",
        format!("Achat au comptoir (Ticket {id})"),
        Some(totals.total_incl_tax),
        now,
    );
    log_audit(doc, user_id, "POS", "Sale", format!("Vente effectuée - Ticket {id}"), now);
    DOCUMENTS_VALIDATED_TOTAL.with_label_values(&["sale"]).inc();

    info!(ticket_id = %id, total = %totals.total_incl_tax, mode = payment_mode.as_str(), "Counter sale completed");
    Ok(sale)
}
