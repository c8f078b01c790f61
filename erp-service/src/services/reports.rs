//! Financial summary over the state document: revenue against purchases and
//! expenses, fleet running cost, stock value per category and support load.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use super::ledger::round2;
use super::stock::stock_value;
use crate::config::ReportsConfig;
use crate::models::{InvoiceStatus, MissionStatus, StateDocument, TicketStatus};

const UNCATEGORIZED: &str = "Sans catégorie";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryValue {
    pub category_id: String,
    pub name: String,
    pub value: Decimal,
}

/// Signals raised when a figure crosses a [`ReportsConfig`] threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Insight {
    /// Purchases and expenses exceed revenue.
    Unprofitable,
    FleetCostAnomaly,
    SupportBottleneck,
    RevenueTargetReached,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// TTC of validated invoices. Drafts and cancelled invoices are excluded.
    pub revenue: Decimal,
    /// TTC of validated purchases.
    pub purchases: Decimal,
    pub expenses: Decimal,
    pub net_result: Decimal,
    pub fuel_cost: Decimal,
    /// Kilometres driven on completed missions.
    pub distance_km: Decimal,
    /// Zero when no completed mission has a distance.
    pub cost_per_km: Decimal,
    pub stock_value: Decimal,
    pub stock_by_category: Vec<CategoryValue>,
    pub open_tickets: usize,
    pub resolved_tickets: usize,
    /// Percent of tickets resolved or closed; 100 when there are none.
    pub resolution_rate: Decimal,
    pub insights: Vec<Insight>,
}

/// Stock value at weighted-average cost per category, in catalog order.
/// Categories holding no value are left out. Products pointing at an unknown
/// category are grouped under one uncategorized entry.
pub fn stock_by_category(doc: &StateDocument) -> Vec<CategoryValue> {
    let value_of = |category_id: &str| -> Decimal {
        round2(
            doc.products
                .iter()
                .filter(|p| p.category_id == category_id && p.stock_qty > Decimal::ZERO)
                .map(|p| p.stock_qty * p.cost)
                .sum(),
        )
    };

    let mut values: Vec<CategoryValue> = doc
        .categories
        .iter()
        .map(|c| CategoryValue {
            category_id: c.id.clone(),
            name: c.name.clone(),
            value: value_of(&c.id),
        })
        .collect();

    let orphaned: Decimal = doc
        .products
        .iter()
        .filter(|p| p.stock_qty > Decimal::ZERO)
        .filter(|p| !doc.categories.iter().any(|c| c.id == p.category_id))
        .map(|p| p.stock_qty * p.cost)
        .sum();
    values.push(CategoryValue {
        category_id: String::new(),
        name: UNCATEGORIZED.to_string(),
        value: round2(orphaned),
    });

    values.retain(|v| v.value > Decimal::ZERO);
    values
}

#[instrument(skip_all)]
pub fn summary(doc: &StateDocument, cfg: &ReportsConfig) -> FinancialSummary {
    let revenue: Decimal = doc
        .invoices
        .iter()
        .filter(|i| matches!(i.status, InvoiceStatus::Validated { .. }))
        .map(|i| i.totals.total_incl_tax)
        .sum();
    let purchases: Decimal = doc
        .purchases
        .iter()
        .filter(|p| !p.is_draft())
        .map(|p| p.totals.total_incl_tax)
        .sum();
    let expenses: Decimal = doc.expenses.iter().map(|e| e.amount).sum();
    let net_result = revenue - purchases - expenses;

    let fuel_cost: Decimal = doc.fuel_logs.iter().map(|f| f.total_amount).sum();
    let distance_km: Decimal = doc
        .missions
        .iter()
        .filter(|m| m.status == MissionStatus::Completed)
        .map(|m| m.distance())
        .sum();
    let cost_per_km = if distance_km > Decimal::ZERO {
        round2(fuel_cost / distance_km)
    } else {
        Decimal::ZERO
    };

    let open_tickets = doc.tickets.iter().filter(|t| t.status.is_open()).count();
    let resolved_tickets = doc
        .tickets
        .iter()
        .filter(|t| matches!(t.status, TicketStatus::Resolved | TicketStatus::Closed))
        .count();
    let resolution_rate = if doc.tickets.is_empty() {
        Decimal::ONE_HUNDRED
    } else {
        round2(Decimal::from(resolved_tickets) * Decimal::ONE_HUNDRED / Decimal::from(doc.tickets.len()))
    };

    let mut insights = Vec::new();
    if net_result < Decimal::ZERO {
        insights.push(Insight::Unprofitable);
    }
    if cost_per_km > cfg.max_cost_per_km {
        insights.push(Insight::FleetCostAnomaly);
    }
    if resolution_rate < cfg.min_resolution_rate {
        insights.push(Insight::SupportBottleneck);
    }
    if revenue > cfg.revenue_target {
        insights.push(Insight::RevenueTargetReached);
    }

    let summary = FinancialSummary {
        revenue: round2(revenue),
        purchases: round2(purchases),
        expenses: round2(expenses),
        net_result: round2(net_result),
        fuel_cost: round2(fuel_cost),
        distance_km,
        cost_per_km,
        stock_value: stock_value(doc),
        stock_by_category: stock_by_category(doc),
        open_tickets,
        resolved_tickets,
        resolution_rate,
        insights,
    };
    debug!(
        revenue = %summary.revenue,
        net_result = %summary.net_result,
        insights = summary.insights.len(),
        "Financial summary computed"
    );
    summary
}
