//! Register Visitor Use Case
//!
//! Onboards a walk-in visitor and admits their vehicle in one call.

use chrono::{DateTime, Utc};
use kernel::id::{LotId, UserId};
use std::sync::Arc;

use crate::application::occupancy::ensure_slot_available;
use crate::domain::entities::{
    EntryRecord, NewEntry, Vehicle, VisitorProfile, optional_text_field, text_field,
};
use crate::domain::repository::{
    EntryRepository, LotRepository, VehicleRepository, VisitorRepository,
};
use crate::domain::restriction::RestrictionCalendar;
use crate::domain::value_objects::{NationalId, Owner, Plate, VehicleCategory};
use crate::error::{ParkingError, ParkingResult};

/// Visitor identity fields
#[derive(Debug, Clone)]
pub struct VisitorProfileInput {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Visitor vehicle fields
#[derive(Debug, Clone)]
pub struct VisitorVehicleInput {
    pub plate: String,
    pub category: VehicleCategory,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub permit_expires_at: DateTime<Utc>,
}

/// Input DTO for visitor registration
#[derive(Debug, Clone)]
pub struct RegisterVisitorInput {
    pub visitor: VisitorProfileInput,
    pub vehicle: VisitorVehicleInput,
    pub lot_id: LotId,
    pub operator_id: UserId,
    pub visit_reason: String,
}

/// Register Visitor Use Case
pub struct RegisterVisitorUseCase<V, S, L, E>
where
    V: VehicleRepository,
    S: VisitorRepository,
    L: LotRepository,
    E: EntryRepository,
{
    vehicle_repo: Arc<V>,
    visitor_repo: Arc<S>,
    lot_repo: Arc<L>,
    entry_repo: Arc<E>,
    calendar: RestrictionCalendar,
}

impl<V, S, L, E> RegisterVisitorUseCase<V, S, L, E>
where
    V: VehicleRepository,
    S: VisitorRepository,
    L: LotRepository,
    E: EntryRepository,
{
    pub fn new(
        vehicle_repo: Arc<V>,
        visitor_repo: Arc<S>,
        lot_repo: Arc<L>,
        entry_repo: Arc<E>,
        calendar: RestrictionCalendar,
    ) -> Self {
        Self {
            vehicle_repo,
            visitor_repo,
            lot_repo,
            entry_repo,
            calendar,
        }
    }

    pub async fn execute(&self, input: RegisterVisitorInput) -> ParkingResult<EntryRecord> {
        self.execute_at(input, Utc::now()).await
    }

    /// Register with an explicit clock reading
    pub async fn execute_at(
        &self,
        input: RegisterVisitorInput,
        now: DateTime<Utc>,
    ) -> ParkingResult<EntryRecord> {
        // Shape checks before any rule or storage access
        let national_id = NationalId::parse(&input.visitor.national_id)?;
        let profile = VisitorProfile::new(
            national_id.clone(),
            &input.visitor.first_name,
            &input.visitor.last_name,
            &input.visitor.phone,
            input.visitor.email.as_deref(),
            now,
        )?;
        let plate = Plate::parse(&input.vehicle.plate)?;
        let visit_reason = text_field("visit reason", &input.visit_reason, 5, 255)?;
        let vehicle = Vehicle {
            plate: plate.clone(),
            category: input.vehicle.category,
            owner: Owner::Visitor(national_id),
            make: optional_text_field("make", input.vehicle.make.as_deref(), 2, 50)?,
            model: optional_text_field("model", input.vehicle.model.as_deref(), 2, 50)?,
            color: optional_text_field("color", input.vehicle.color.as_deref(), 2, 30)?,
            permit_expires_at: Some(input.vehicle.permit_expires_at),
        };

        if input.vehicle.permit_expires_at <= now {
            return Err(ParkingError::validation("permit expiry must be in the future"));
        }

        let verdict = self.calendar.evaluate(plate.as_str(), now);
        if verdict.has_restriction {
            return Err(ParkingError::Restricted(Box::new(verdict)));
        }

        let lot = self
            .lot_repo
            .find_lot(input.lot_id)
            .await?
            .ok_or(ParkingError::LotNotFound(input.lot_id))?;

        ensure_slot_available(&lot, vehicle.category)?;

        let profile = self.visitor_repo.upsert_visitor(&profile).await?;
        let vehicle = self.vehicle_repo.upsert_visitor_vehicle(&vehicle).await?;

        if self.entry_repo.find_active_by_plate(&plate).await?.is_some() {
            return Err(ParkingError::ActiveEntryExists(plate.to_string()));
        }

        let entry = self
            .entry_repo
            .open_entry(&NewEntry {
                plate,
                operator_id: input.operator_id,
                lot_id: lot.id,
                category: vehicle.category,
                entered_at: now,
                visit_reason: Some(visit_reason),
            })
            .await?;

        tracing::info!(
            entry_id = %entry.id,
            plate = %entry.plate,
            lot_id = %entry.lot_id,
            national_id = %profile.national_id,
            "Visitor admitted"
        );

        Ok(entry)
    }
}
