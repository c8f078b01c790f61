//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationKind {
    #[default]
    #[serde(rename = "Système", alias = "System")]
    System,
    #[serde(rename = "Flotte", alias = "Fleet")]
    Fleet,
    Maintenance,
    Support,
    Finance,
    #[serde(rename = "RH", alias = "HumanResources")]
    HumanResources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationPriority {
    #[default]
    #[serde(rename = "Info", alias = "Low")]
    Low,
    #[serde(rename = "Action Requise", alias = "Medium")]
    Medium,
    #[serde(rename = "Urgent", alias = "High")]
    High,
    #[serde(rename = "Critique", alias = "Critical")]
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Addressed to this user directly or to their role.
    pub fn is_visible_to(&self, user_id: &str, role: Role) -> bool {
        self.user_id.as_deref() == Some(user_id) || self.role == Some(role)
    }
}

/// Input for raising a notification.
#[derive(Debug, Clone, Default)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    pub related_entity_id: Option<String>,
    pub related_entity_type: Option<String>,
}
