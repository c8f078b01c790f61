//! Support tickets, SLA tracking and the periodic pulse check.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use super::error::{ServiceError, ServiceResult};
use super::ids::entity_id;
use super::journal::{log_audit, notify};
use super::scoring::rescore_drivers;
use crate::config::SlaHours;
use crate::models::{
    NewNotification, NewTicket, NotificationKind, NotificationPriority, Role, StateDocument,
    Ticket, TicketPriority, TicketStatus,
};

const TICKET_ENTITY: &str = "ticket";

pub fn sla_deadline(priority: TicketPriority, created_at: DateTime<Utc>, hours: &SlaHours) -> DateTime<Utc> {
    let h = match priority {
        TicketPriority::Critical => hours.critical,
        TicketPriority::High => hours.high,
        TicketPriority::Medium | TicketPriority::Low => hours.standard,
    };
    created_at + Duration::hours(h)
}

#[instrument(skip(doc, input, hours), fields(priority = ?input.priority))]
pub fn open_ticket(
    doc: &mut StateDocument,
    input: NewTicket,
    user_id: &str,
    hours: &SlaHours,
    now: DateTime<Utc>,
) -> ServiceResult<String> {
    if input.subject.trim().is_empty() {
        return Err(ServiceError::InvalidInput("ticket subject is required".to_string()));
    }
    let id = entity_id("TK", now, |id| doc.tickets.iter().any(|t| t.id == id));
    let subject = input.subject.clone();
    doc.tickets.insert(
        0,
        Ticket {
            id: id.clone(),
            client_id: input.client_id,
            user_id: user_id.to_string(),
            assigned_to: None,
            subject: input.subject,
            description: input.description,
            category: input.category,
            priority: input.priority,
            status: TicketStatus::Open,
            related_vehicle_id: input.related_vehicle_id,
            related_driver_id: input.related_driver_id,
            sla_deadline: Some(sla_deadline(input.priority, now, hours)),
            resolution_time: None,
            created_at: now,
            updated_at: now,
        },
    );
    log_audit(doc, user_id, "Support", "Create Ticket", subject, now);
    info!(ticket_id = %id, "Ticket opened");
    Ok(id)
}

/// Moves a ticket to `status`. Resolving or closing records the resolution
/// time in minutes; reopening clears it.
#[instrument(skip(doc))]
pub fn set_ticket_status(
    doc: &mut StateDocument,
    ticket_id: &str,
    status: TicketStatus,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    let ticket = doc
        .tickets
        .iter_mut()
        .find(|t| t.id == ticket_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(ticket_id.to_string()))?;
    ticket.status = status;
    ticket.updated_at = now;
    ticket.resolution_time = if status.is_open() {
        None
    } else {
        ticket
            .resolution_time
            .or(Some((now - ticket.created_at).num_minutes()))
    };
    Ok(())
}

/// Periodic health pass: refreshes driver scores and raises one critical
/// notification per open ticket past its SLA. Returns how many were raised.
#[instrument(skip(doc))]
pub fn run_pulse(doc: &mut StateDocument, now: DateTime<Utc>) -> usize {
    rescore_drivers(doc);

    let breached: Vec<(String, String)> = doc
        .tickets
        .iter()
        .filter(|t| t.status.is_open())
        .filter(|t| t.sla_deadline.is_some_and(|deadline| deadline < now))
        .filter(|t| {
            !doc.notifications.iter().any(|n| {
                n.related_entity_id.as_deref() == Some(t.id.as_str())
                    && n.priority == NotificationPriority::Critical
            })
        })
        .map(|t| (t.id.clone(), t.subject.clone()))
        .collect();

    for (id, subject) in &breached {
        warn!(ticket_id = %id, "Ticket breached its SLA");
        notify(
            doc,
            NewNotification {
                kind: NotificationKind::Support,
                priority: NotificationPriority::Critical,
                title: format!("SLA Dépassé : Ticket {id}"),
                message: format!("Le ticket \"{subject}\" nécessite une intervention immédiate."),
                user_id: None,
                role: Some(Role::Manager),
                related_entity_id: Some(id.clone()),
                related_entity_type: Some(TICKET_ENTITY.to_string()),
            },
            now,
        );
    }
    breached.len()
}
