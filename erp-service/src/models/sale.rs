//! Point-of-sale tickets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    Card,
    Transfer,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Card => "card",
            PaymentMode::Transfer => "transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: String,
    pub name: String,
    pub quantity: Decimal,
    /// Catalog unit price, tax excluded, at the time the item entered the cart.
    pub catalog_price: Decimal,
    #[serde(rename = "priceHT")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(rename = "tva")]
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub items: Vec<SaleItem>,
    #[serde(default)]
    pub global_discount: Decimal,
    #[serde(rename = "totalHT")]
    pub total_excl_tax: Decimal,
    #[serde(rename = "totalTVA")]
    pub total_tax: Decimal,
    #[serde(rename = "totalTTC")]
    pub total_incl_tax: Decimal,
    pub payment_mode: PaymentMode,
    #[serde(default = "paid")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

fn paid() -> String {
    "Paid".to_string()
}
