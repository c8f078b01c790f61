//! Supplier purchase orders and the purchase-price log.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::default_tax_rate;
use super::invoice::{empty_as_none, empty_date_as_none, DocumentTotals, LineTotals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum PurchaseStatus {
    #[serde(rename = "Draft", alias = "Brouillon")]
    Draft,
    #[serde(rename = "Validated", alias = "Validé", rename_all = "camelCase")]
    Validated {
        number: String,
        #[serde(default)]
        validated_at: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub description: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(rename = "pricePurchaseHT")]
    pub unit_cost: Decimal,
    #[serde(default = "default_tax_rate")]
    pub tva_rate: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(flatten)]
    pub totals: LineTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    #[serde(flatten)]
    pub status: PurchaseStatus,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub supplier_id: Option<String>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub lines: Vec<PurchaseLine>,
    #[serde(flatten)]
    pub totals: DocumentTotals,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    pub fn is_draft(&self) -> bool {
        matches!(self.status, PurchaseStatus::Draft)
    }

    pub fn number(&self) -> Option<&str> {
        match &self.status {
            PurchaseStatus::Draft => None,
            PurchaseStatus::Validated { number, .. } => Some(number),
        }
    }
}

/// Append-only record of a unit cost paid to a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub supplier_id: String,
    #[serde(rename = "priceHT")]
    pub unit_cost: Decimal,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub date: Option<NaiveDate>,
    pub purchase_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_french_status_is_accepted() {
        let purchase: Purchase = serde_json::from_value(json!({
            "id": "PUR-1",
            "number": "BA-123456",
            "status": "Validé",
            "supplierId": "s1",
            "date": "2024-02-10",
            "lines": [],
            "totalHT": 0, "totalTVA": 0, "totalTTC": 0,
            "createdAt": "2024-02-10T08:00:00Z"
        }))
        .unwrap();

        assert!(!purchase.is_draft());
        assert_eq!(purchase.number(), Some("BA-123456"));
        assert_eq!(purchase.date, NaiveDate::from_ymd_opt(2024, 2, 10));
    }

    #[test]
    fn test_brouillon_is_draft() {
        let purchase: Purchase = serde_json::from_value(json!({
            "id": "PUR-2",
            "number": "BA-000001",
            "status": "Brouillon",
            "createdAt": "2024-02-10T08:00:00Z"
        }))
        .unwrap();
        assert!(purchase.is_draft());
        assert_eq!(purchase.totals, DocumentTotals::default());
    }
}
