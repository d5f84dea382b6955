//! Admit Vehicle Use Case
//!
//! Checks run in a fixed order and stop at the first failure:
//! vehicle, operator, lot, free slot, active entry for the plate, active
//! entry for the owner at the same lot, pico y placa. Only then is the
//! entry opened, together with its slot, as one atomic repository call.

use chrono::{DateTime, Utc};
use kernel::id::{LotId, UserId};
use std::sync::Arc;

use crate::application::occupancy::ensure_slot_available;
use crate::domain::entities::{EntryRecord, NewEntry};
use crate::domain::repository::{
    EntryRepository, LotRepository, OperatorDirectory, VehicleRepository,
};
use crate::domain::restriction::RestrictionCalendar;
use crate::domain::value_objects::Plate;
use crate::error::{ParkingError, ParkingResult};

/// Input DTO for admission
#[derive(Debug, Clone)]
pub struct AdmitVehicleInput {
    pub plate: String,
    pub operator_id: UserId,
    pub lot_id: LotId,
}

/// Admit Vehicle Use Case
pub struct AdmitVehicleUseCase<V, O, L, E>
where
    V: VehicleRepository,
    O: OperatorDirectory,
    L: LotRepository,
    E: EntryRepository,
{
    vehicle_repo: Arc<V>,
    operators: Arc<O>,
    lot_repo: Arc<L>,
    entry_repo: Arc<E>,
    calendar: RestrictionCalendar,
}

impl<V, O, L, E> AdmitVehicleUseCase<V, O, L, E>
where
    V: VehicleRepository,
    O: OperatorDirectory,
    L: LotRepository,
    E: EntryRepository,
{
    pub fn new(
        vehicle_repo: Arc<V>,
        operators: Arc<O>,
        lot_repo: Arc<L>,
        entry_repo: Arc<E>,
        calendar: RestrictionCalendar,
    ) -> Self {
        Self {
            vehicle_repo,
            operators,
            lot_repo,
            entry_repo,
            calendar,
        }
    }

    pub async fn execute(&self, input: AdmitVehicleInput) -> ParkingResult<EntryRecord> {
        self.execute_at(input, Utc::now()).await
    }

    /// Admit with an explicit clock reading
    pub async fn execute_at(
        &self,
        input: AdmitVehicleInput,
        now: DateTime<Utc>,
    ) -> ParkingResult<EntryRecord> {
        let plate = Plate::parse(&input.plate)?;

        let vehicle = self
            .vehicle_repo
            .find_vehicle(&plate)
            .await?
            .ok_or_else(|| ParkingError::VehicleNotFound(plate.to_string()))?;

        if !self.operators.operator_exists(input.operator_id).await? {
            return Err(ParkingError::OperatorNotFound(input.operator_id));
        }

        let lot = self
            .lot_repo
            .find_lot(input.lot_id)
            .await?
            .ok_or(ParkingError::LotNotFound(input.lot_id))?;

        // Fast path only; the decrement below is the authoritative check
        ensure_slot_available(&lot, vehicle.category)?;

        if self.entry_repo.find_active_by_plate(&plate).await?.is_some() {
            return Err(ParkingError::ActiveEntryExists(plate.to_string()));
        }

        if let Some(other) = self
            .entry_repo
            .find_active_by_owner(&vehicle.owner, lot.id)
            .await?
        {
            tracing::debug!(
                owner = %vehicle.owner,
                parked_plate = %other.plate,
                "Owner already parked at lot"
            );
            return Err(ParkingError::OwnerAlreadyParked {
                owner: vehicle.owner.reference().to_string(),
                lot_id: lot.id,
            });
        }

        let verdict = self.calendar.evaluate(plate.as_str(), now);
        if verdict.has_restriction {
            return Err(ParkingError::Restricted(Box::new(verdict)));
        }

        let entry = self
            .entry_repo
            .open_entry(&NewEntry {
                plate,
                operator_id: input.operator_id,
                lot_id: lot.id,
                category: vehicle.category,
                entered_at: now,
                visit_reason: None,
            })
            .await?;

        tracing::info!(
            entry_id = %entry.id,
            plate = %entry.plate,
            lot_id = %entry.lot_id,
            category = %entry.category,
            "Vehicle admitted"
        );

        Ok(entry)
    }
}
