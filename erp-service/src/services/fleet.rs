//! Missions: planning with a sequential number and completion with the
//! arrival odometer reading.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::error::{ServiceError, ServiceResult};
use super::ids::entity_id;
use super::ledger::ensure_non_negative;
use super::scoring::driver_score;
use crate::models::{DocumentKind, Mission, MissionStatus, StateDocument};

#[derive(Debug, Clone)]
pub struct NewMission {
    pub driver_id: String,
    pub vehicle_id: String,
    pub destination: String,
    pub start_km: Decimal,
}

#[instrument(skip(doc, input), fields(driver_id = %input.driver_id))]
pub fn plan_mission(doc: &mut StateDocument, input: NewMission, now: DateTime<Utc>) -> ServiceResult<String> {
    ensure_non_negative("start km", input.start_km)?;
    if !doc.drivers.iter().any(|d| d.id == input.driver_id) {
        return Err(ServiceError::MissingParty("driver"));
    }
    if !doc.vehicles.iter().any(|v| v.id == input.vehicle_id) {
        return Err(ServiceError::MissingParty("vehicle"));
    }
    let id = entity_id("LOG", now, |id| doc.missions.iter().any(|m| m.id == id));
    let number = doc.settings.issue(DocumentKind::Mission, now.year());
    doc.missions.insert(
        0,
        Mission {
            id,
            number: number.clone(),
            status: MissionStatus::Planned,
            start_date: now.to_rfc3339(),
            vehicle_id: input.vehicle_id,
            driver_id: input.driver_id,
            start_km: input.start_km,
            end_km: None,
            destination: input.destination,
            created_at: now,
        },
    );
    info!(number = %number, "Mission planned");
    Ok(number)
}

/// Closes a mission, advances the vehicle odometer and refreshes the driver's
/// score. Returns the new score.
#[instrument(skip(doc))]
pub fn complete_mission(doc: &mut StateDocument, mission_id: &str, end_km: Decimal) -> ServiceResult<u8> {
    let mission = doc
        .missions
        .iter_mut()
        .find(|m| m.id == mission_id)
        .ok_or_else(|| ServiceError::DocumentNotFound(mission_id.to_string()))?;
    if matches!(mission.status, MissionStatus::Completed | MissionStatus::Cancelled) {
        return Err(ServiceError::InvalidTransition {
            from: "closed",
            to: "completed",
        });
    }
    if end_km < mission.start_km {
        return Err(ServiceError::InvalidInput(format!(
            "arrival odometer {end_km} is below departure {}",
            mission.start_km
        )));
    }
    mission.status = MissionStatus::Completed;
    mission.end_km = Some(end_km);
    let driver_id = mission.driver_id.clone();
    let vehicle_id = mission.vehicle_id.clone();

    if let Some(vehicle) = doc.vehicles.iter_mut().find(|v| v.id == vehicle_id) {
        vehicle.current_km = vehicle.current_km.max(end_km);
    }
    let score = driver_score(&driver_id, &doc.missions, &doc.fuel_logs);
    if let Some(driver) = doc.drivers.iter_mut().find(|d| d.id == driver_id) {
        driver.smart_score = Some(score);
    }
    Ok(score)
}
