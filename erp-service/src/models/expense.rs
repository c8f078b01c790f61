//! Operating expenses booked outside the purchase flow (rent, utilities, fees).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::empty_date_as_none;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: String,
}
