//! Support tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    #[serde(rename = "Ouvert", alias = "Open")]
    Open,
    #[serde(rename = "En cours", alias = "InProgress")]
    InProgress,
    #[serde(rename = "Résolu", alias = "Resolved")]
    Resolved,
    #[serde(rename = "Fermé", alias = "Closed")]
    Closed,
}

impl TicketStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketPriority {
    #[serde(rename = "Basse", alias = "Low")]
    Low,
    #[serde(rename = "Moyenne", alias = "Medium")]
    Medium,
    #[serde(rename = "Haute", alias = "High")]
    High,
    #[serde(rename = "Critique", alias = "Critical")]
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TicketCategory {
    #[serde(rename = "Technique", alias = "Technical")]
    Technical,
    #[serde(rename = "Logistique", alias = "Logistics")]
    Logistics,
    #[serde(rename = "Facturation", alias = "Billing")]
    Billing,
    #[default]
    #[serde(rename = "Autre", alias = "Other")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_vehicle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_driver_id: Option<String>,
    #[serde(default)]
    pub sla_deadline: Option<DateTime<Utc>>,
    /// Minutes from creation to resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_time: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for opening a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub client_id: Option<String>,
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub related_vehicle_id: Option<String>,
    pub related_driver_id: Option<String>,
}
