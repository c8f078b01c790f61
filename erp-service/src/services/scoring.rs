//! Driver and client scoring.
//!
//! Scores are heuristics recomputed on every pass; nothing here is a source
//! of truth.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::ScoringConfig;
use crate::models::{Client, FuelLog, Invoice, InvoiceStatus, Mission, MissionStatus, StateDocument};

pub const DEFAULT_DRIVER_SCORE: u8 = 70;

/// Litres per 100 km assumed when no distance has been recorded.
const FALLBACK_CONSUMPTION: f64 = 10.0;
/// Consumption (L/100 km) at which the fuel component is full.
const REFERENCE_CONSUMPTION: f64 = 8.0;

/// Composite driver score in `0..=100`: trip completion (40%), fuel
/// efficiency (30%) and recorded mileage (30%).
pub fn driver_score(driver_id: &str, missions: &[Mission], fuel_logs: &[FuelLog]) -> u8 {
    let assigned: Vec<&Mission> = missions.iter().filter(|m| m.driver_id == driver_id).collect();
    let completed: Vec<&&Mission> = assigned
        .iter()
        .filter(|m| m.status == MissionStatus::Completed)
        .collect();
    if completed.is_empty() {
        return DEFAULT_DRIVER_SCORE;
    }

    let trip_score = completed.len() as f64 / assigned.len().max(1) as f64 * 100.0;

    let total_km: Decimal = completed.iter().map(|m| m.distance()).sum();
    let total_liters: Decimal = fuel_logs
        .iter()
        .filter(|f| f.driver_id == driver_id)
        .map(|f| f.liters)
        .sum();
    let total_km = total_km.to_f64().unwrap_or(0.0);
    let total_liters = total_liters.to_f64().unwrap_or(0.0);

    let consumption = if total_km > 0.0 {
        total_liters / total_km * 100.0
    } else {
        FALLBACK_CONSUMPTION
    };
    let fuel_score = (100.0 - (consumption - REFERENCE_CONSUMPTION) * 10.0).clamp(0.0, 100.0);
    let km_score = if total_km > 0.0 { 100.0 } else { 50.0 };

    let score = (trip_score * 0.4 + fuel_score * 0.3 + km_score * 0.3).round();
    score.clamp(0.0, 100.0) as u8
}

/// Refreshes the derived `smartScore` of every driver.
#[instrument(skip(doc))]
pub fn rescore_drivers(doc: &mut StateDocument) {
    let scores: Vec<u8> = doc
        .drivers
        .iter()
        .map(|d| driver_score(&d.id, &doc.missions, &doc.fuel_logs))
        .collect();
    for (driver, score) in doc.drivers.iter_mut().zip(scores) {
        driver.smart_score = Some(score);
    }
    debug!(drivers = doc.drivers.len(), "Drivers rescored");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Segment {
    #[serde(rename = "VIP")]
    Vip,
    Gold,
    #[serde(rename = "À Relancer")]
    NeedsReactivation,
    Standard,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Vip => "VIP",
            Segment::Gold => "Gold",
            Segment::NeedsReactivation => "NeedsReactivation",
            Segment::Standard => "Standard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientScore {
    pub client_id: String,
    pub client_name: String,
    pub revenue: Decimal,
    pub order_count: usize,
    pub last_order_at: DateTime<Utc>,
    pub days_since_last_order: i64,
    pub score: f64,
    pub segment: Segment,
}

/// RFM-style score over the client's validated invoices. Cancelled invoices
/// count neither as revenue nor as orders.
pub fn client_score(
    client: &Client,
    invoices: &[Invoice],
    now: DateTime<Utc>,
    cfg: &ScoringConfig,
) -> ClientScore {
    let validated: Vec<(&Invoice, DateTime<Utc>)> = invoices
        .iter()
        .filter(|i| i.client_id.as_deref() == Some(client.id.as_str()))
        .filter_map(|i| match &i.status {
            InvoiceStatus::Validated { validated_at, .. } => Some((i, *validated_at)),
            _ => None,
        })
        .collect();

    let revenue: Decimal = validated.iter().map(|(i, _)| i.totals.total_incl_tax).sum();
    let order_count = validated.len();
    let last_order_at = validated
        .iter()
        .map(|(_, at)| *at)
        .max()
        .unwrap_or(client.created_at);
    let days_since_last_order = (now - last_order_at).num_days();

    let divisor = if cfg.revenue_divisor.is_zero() {
        Decimal::ONE
    } else {
        cfg.revenue_divisor
    };
    let mut score = (revenue / divisor).to_f64().unwrap_or(0.0) + order_count as f64 * cfg.order_weight;
    if days_since_last_order < cfg.recency_days {
        score += cfg.recency_bonus;
    }

    let segment = if score > cfg.vip_threshold {
        Segment::Vip
    } else if score > cfg.gold_threshold {
        Segment::Gold
    } else if days_since_last_order > cfg.reactivation_days {
        Segment::NeedsReactivation
    } else {
        Segment::Standard
    };

    ClientScore {
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        revenue,
        order_count,
        last_order_at,
        days_since_last_order,
        score,
        segment,
    }
}

/// Scores every client, best first.
pub fn client_segments(doc: &StateDocument, now: DateTime<Utc>, cfg: &ScoringConfig) -> Vec<ClientScore> {
    let mut scores: Vec<ClientScore> = doc
        .clients
        .iter()
        .map(|c| client_score(c, &doc.invoices, now, cfg))
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}
