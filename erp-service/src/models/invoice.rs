//! Invoice model: lines, totals and the validation lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::default_tax_rate;

/// Kind of catalog item referenced by an invoice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    #[serde(rename = "PRODUIT", alias = "Product")]
    Product,
    #[serde(rename = "SERVICE", alias = "Service")]
    Service,
}

/// Invoice type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvoiceType {
    #[default]
    #[serde(rename = "Mixte", alias = "Mixed")]
    Mixed,
    #[serde(rename = "Produit", alias = "Product")]
    Product,
    Service,
    #[serde(rename = "Avoir", alias = "CreditNote")]
    CreditNote,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Mixed => "mixed",
            InvoiceType::Product => "product",
            InvoiceType::Service => "service",
            InvoiceType::CreditNote => "credit_note",
        }
    }
}

/// Invoice lifecycle. A validated invoice always carries its number and
/// validation timestamp; a cancelled one keeps both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum InvoiceStatus {
    Draft,
    #[serde(rename_all = "camelCase", alias = "Paid")]
    Validated {
        number: String,
        validated_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Cancelled {
        number: String,
        validated_at: DateTime<Utc>,
        #[serde(default)]
        cancelled_at: Option<DateTime<Utc>>,
        #[serde(default)]
        cancellation_reason: String,
    },
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Validated { .. } => "validated",
            InvoiceStatus::Cancelled { .. } => "cancelled",
        }
    }

    pub fn number(&self) -> Option<&str> {
        match self {
            InvoiceStatus::Draft => None,
            InvoiceStatus::Validated { number, .. } | InvoiceStatus::Cancelled { number, .. } => {
                Some(number)
            }
        }
    }
}

/// Line totals as produced by the ledger primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineTotals {
    #[serde(rename = "totalHT")]
    pub total_excl_tax: Decimal,
    #[serde(rename = "totalTVA")]
    pub total_tax: Decimal,
    #[serde(rename = "totalTTC")]
    pub total_incl_tax: Decimal,
}

/// Aggregated totals of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentTotals {
    #[serde(rename = "totalHT")]
    pub total_excl_tax: Decimal,
    #[serde(rename = "totalTVA")]
    pub total_tax: Decimal,
    #[serde(rename = "totalTTC")]
    pub total_incl_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub id: String,
    pub item_id: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub description: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(rename = "priceHT")]
    pub unit_price: Decimal,
    #[serde(default = "default_tax_rate")]
    pub tva_rate: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(flatten)]
    pub totals: LineTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: InvoiceType,
    #[serde(flatten)]
    pub status: InvoiceStatus,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    #[serde(flatten)]
    pub totals: DocumentTotals,
    #[serde(default)]
    pub global_discount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub due_date: Option<NaiveDate>,
}

impl Invoice {
    pub fn is_draft(&self) -> bool {
        matches!(self.status, InvoiceStatus::Draft)
    }

    pub fn number(&self) -> Option<&str> {
        self.status.number()
    }

    pub fn validated_at(&self) -> Option<DateTime<Utc>> {
        match &self.status {
            InvoiceStatus::Draft => None,
            InvoiceStatus::Validated { validated_at, .. }
            | InvoiceStatus::Cancelled { validated_at, .. } => Some(*validated_at),
        }
    }
}

/// Reads `""` as absent, the way the back office stores "no client selected".
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

pub(crate) fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => {
            // Accept both `2024-03-31` and full ISO timestamps.
            let day = s.get(..10).unwrap_or(&s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// Partial update applied to a draft line.
#[derive(Debug, Clone, Default)]
pub struct LinePatch {
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub description: Option<String>,
}
