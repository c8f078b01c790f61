//! Stock movement log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Receipt from a validated purchase.
    Purchase,
    /// Issue through a validated invoice or a POS ticket.
    Sale,
    In,
    Out,
    /// Sets the on-hand quantity to an absolute value.
    Adjustment,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Purchase => "purchase",
            MovementKind::Sale => "sale",
            MovementKind::In => "in",
            MovementKind::Out => "out",
            MovementKind::Adjustment => "adjustment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: Decimal,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}
