//! Fleet: drivers, vehicles, missions and fuel logs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cin: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub license_expiry: String,
    #[serde(default = "active")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_user_id: Option<String>,
    /// Derived by the scoring pass; never edited by hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_score: Option<u8>,
    #[serde(default)]
    pub contract_type: String,
    pub created_at: DateTime<Utc>,
}

fn active() -> String {
    "Actif".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    #[serde(rename = "Actif", alias = "Active")]
    Active,
    #[serde(rename = "En Maintenance", alias = "Maintenance")]
    Maintenance,
    #[serde(rename = "Hors Service", alias = "OutOfService")]
    OutOfService,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub plate: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub current_km: Decimal,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    #[serde(rename = "Planifiée", alias = "Planned")]
    Planned,
    #[serde(rename = "En cours", alias = "Ongoing")]
    Ongoing,
    #[serde(rename = "Terminée", alias = "Completed")]
    Completed,
    #[serde(rename = "Annulée", alias = "Cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub number: String,
    pub status: MissionStatus,
    #[serde(default)]
    pub start_date: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub start_km: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_km: Option<Decimal>,
    #[serde(default)]
    pub destination: String,
    pub created_at: DateTime<Utc>,
}

impl Mission {
    /// Distance covered, never negative. A mission without an odometer
    /// reading at arrival counts as zero.
    pub fn distance(&self) -> Decimal {
        match self.end_km {
            Some(end) if end > self.start_km => end - self.start_km,
            _ => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelLog {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub vehicle_id: String,
    pub driver_id: String,
    pub liters: Decimal,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub odometer: Decimal,
}
