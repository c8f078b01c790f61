//! Clients, suppliers and the client activity journal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Id of the walk-in client every counter sale is booked against.
pub const WALK_IN_CLIENT_ID: &str = "c1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientType {
    #[default]
    #[serde(rename = "Particulier", alias = "Individual")]
    Individual,
    #[serde(rename = "Société", alias = "Company")]
    Company,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientStatus {
    #[default]
    #[serde(rename = "Actif", alias = "Active")]
    Active,
    #[serde(rename = "Bloqué", alias = "Blocked")]
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ClientType,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn walk_in(now: DateTime<Utc>) -> Self {
        Self {
            id: WALK_IN_CLIENT_ID.to_string(),
            name: "Client de Passage".to_string(),
            kind: ClientType::Individual,
            status: ClientStatus::Active,
            phone: String::new(),
            city: "Casablanca".to_string(),
            ice: None,
            address: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ice: Option<String>,
    #[serde(rename = "if", default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub city: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAction {
    pub id: String,
    pub client_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: String,
    pub user_id: String,
    pub module: String,
    pub action: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}
