//! Append-only journals kept inside the state document: audit trail, client
//! activity and notifications. All are stored newest first.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{
    AuditLog, ClientAction, NewNotification, Notification, Role, StateDocument,
};

use super::ids::entity_id;

pub const AUDIT_LOG_CAP: usize = 1000;
pub const NOTIFICATION_CAP: usize = 500;

pub fn log_audit(
    doc: &mut StateDocument,
    user_id: &str,
    module: &str,
    action: &str,
    details: impl Into<String>,
    now: DateTime<Utc>,
) {
    let id = entity_id("LOG", now, |id| doc.audit_logs.iter().any(|l| l.id == id));
    doc.audit_logs.insert(
        0,
        AuditLog {
            id,
            user_id: user_id.to_string(),
            module: module.to_string(),
            action: action.to_string(),
            details: details.into(),
            created_at: now,
        },
    );
    doc.audit_logs.truncate(AUDIT_LOG_CAP);
}

pub fn log_client_action(
    doc: &mut StateDocument,
    client_id: &str,
    user_id: &str,
    kind: &str,
    description: impl Into<String>,
    amount: Option<Decimal>,
    now: DateTime<Utc>,
) {
    let id = entity_id("ACT", now, |id| doc.client_actions.iter().any(|a| a.id == id));
    doc.client_actions.insert(
        0,
        ClientAction {
            id,
            client_id: client_id.to_string(),
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            description: description.into(),
            amount,
            created_at: now,
        },
    );
}

pub fn notify(doc: &mut StateDocument, input: NewNotification, now: DateTime<Utc>) -> String {
    let id = entity_id("NTF", now, |id| doc.notifications.iter().any(|n| n.id == id));
    let title = if input.title.trim().is_empty() {
        "Alerte".to_string()
    } else {
        input.title
    };
    debug!(notification_id = %id, priority = ?input.priority, "Raising notification");
    doc.notifications.insert(
        0,
        Notification {
            id: id.clone(),
            kind: input.kind,
            priority: input.priority,
            title,
            message: input.message,
            user_id: input.user_id,
            role: input.role,
            is_read: false,
            created_at: now,
            related_entity_id: input.related_entity_id,
            related_entity_type: input.related_entity_type,
            expires_at: None,
        },
    );
    doc.notifications.truncate(NOTIFICATION_CAP);
    id
}

pub fn notifications_for<'a>(
    doc: &'a StateDocument,
    user_id: &str,
    role: Role,
) -> Vec<&'a Notification> {
    doc.notifications
        .iter()
        .filter(|n| n.is_visible_to(user_id, role))
        .collect()
}

/// Returns false when no notification has that id.
pub fn mark_read(doc: &mut StateDocument, notification_id: &str) -> bool {
    match doc.notifications.iter_mut().find(|n| n.id == notification_id) {
        Some(n) => {
            n.is_read = true;
            true
        }
        None => false,
    }
}

/// Marks every notification visible to the user as read; returns how many changed.
pub fn mark_all_read(doc: &mut StateDocument, user_id: &str, role: Role) -> usize {
    let mut changed = 0;
    for n in doc
        .notifications
        .iter_mut()
        .filter(|n| !n.is_read && n.is_visible_to(user_id, role))
    {
        n.is_read = true;
        changed += 1;
    }
    changed
}
