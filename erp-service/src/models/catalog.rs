//! Catalog models: stock-tracked products and non-stocked services.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::ItemType;

pub(crate) fn default_tax_rate() -> Decimal {
    Decimal::from(20)
}

/// Product category, used to break the stock value down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Stock-tracked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub category_id: String,
    /// Catalog price, tax included.
    pub price: Decimal,
    /// Weighted-average cost, tax excluded. Moved only by purchase validation.
    #[serde(default)]
    pub cost: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub stock_qty: Decimal,
    #[serde(default)]
    pub min_stock: Decimal,
    #[serde(rename = "tva", default = "default_tax_rate")]
    pub tax_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock_qty <= self.min_stock
    }
}

/// Billable service (labour, subscriptions). Never stock-tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub id: String,
    #[serde(default)]
    pub reference: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(rename = "priceHT")]
    pub price_ht: Decimal,
    #[serde(default = "default_tax_rate")]
    pub tva_rate: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub is_variable_price: bool,
}

/// Borrowed view over anything that can be put on an invoice line.
#[derive(Debug, Clone, Copy)]
pub enum CatalogItem<'a> {
    Product(&'a Product),
    Service(&'a ServiceItem),
}

impl CatalogItem<'_> {
    pub fn id(&self) -> &str {
        match self {
            CatalogItem::Product(p) => &p.id,
            CatalogItem::Service(s) => &s.id,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            CatalogItem::Product(_) => ItemType::Product,
            CatalogItem::Service(_) => ItemType::Service,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CatalogItem::Product(p) => &p.name,
            CatalogItem::Service(s) => &s.name,
        }
    }

    pub fn unit(&self) -> &str {
        match self {
            CatalogItem::Product(p) => &p.unit,
            CatalogItem::Service(s) => &s.unit,
        }
    }

    pub fn tax_rate(&self) -> Decimal {
        match self {
            CatalogItem::Product(p) => p.tax_rate,
            CatalogItem::Service(s) => s.tva_rate,
        }
    }
}
