//! Lot Occupancy Use Case
//!
//! Lot registration, lookup, edits and manual slot adjustments. Counter
//! changes go through the repository's atomic conditional update.

use kernel::id::LotId;
use std::sync::Arc;

use crate::domain::entities::{Lot, LotUpdate, NewLot, SlotPool};
use crate::domain::repository::LotRepository;
use crate::domain::value_objects::VehicleCategory;
use crate::error::{ParkingError, ParkingResult};

/// Input DTO for lot creation
#[derive(Debug, Clone)]
pub struct CreateLotInput {
    pub name: String,
    pub address: String,
    pub car_capacity: i32,
    pub car_available: Option<i32>,
    pub motorcycle_capacity: i32,
    pub motorcycle_available: Option<i32>,
}

/// Fail with `NoSlotsAvailable` when the lot is full for `category`
pub fn ensure_slot_available(lot: &Lot, category: VehicleCategory) -> ParkingResult<()> {
    if lot.has_free_slot(category) {
        Ok(())
    } else {
        Err(ParkingError::NoSlotsAvailable(category))
    }
}

/// Lot Occupancy Use Case
pub struct LotOccupancy<L>
where
    L: LotRepository,
{
    lot_repo: Arc<L>,
}

impl<L> LotOccupancy<L>
where
    L: LotRepository,
{
    pub fn new(lot_repo: Arc<L>) -> Self {
        Self { lot_repo }
    }

    pub async fn create(&self, input: CreateLotInput) -> ParkingResult<Lot> {
        let car = SlotPool::new(
            input.car_capacity,
            input.car_available.unwrap_or(input.car_capacity),
        )?;
        let motorcycle = SlotPool::new(
            input.motorcycle_capacity,
            input.motorcycle_available.unwrap_or(input.motorcycle_capacity),
        )?;
        let new_lot = NewLot::new(&input.name, &input.address, car, motorcycle)?;

        let lot = self.lot_repo.create_lot(&new_lot).await?;
        tracing::info!(lot_id = %lot.id, name = %lot.name, "Lot created");
        Ok(lot)
    }

    pub async fn get(&self, lot_id: LotId) -> ParkingResult<Lot> {
        self.lot_repo
            .find_lot(lot_id)
            .await?
            .ok_or(ParkingError::LotNotFound(lot_id))
    }

    pub async fn list(&self) -> ParkingResult<Vec<Lot>> {
        self.lot_repo.list_lots().await
    }

    /// Edit name, address, capacities or counters of a lot
    pub async fn update(&self, lot_id: LotId, update: LotUpdate) -> ParkingResult<Lot> {
        if update.is_empty() {
            return Err(ParkingError::validation("no lot field to update"));
        }
        let lot = self.lot_repo.update_lot(lot_id, &update).await?;

        tracing::info!(
            lot_id = %lot_id,
            car_capacity = lot.car.capacity,
            car_available = lot.car.available,
            motorcycle_capacity = lot.motorcycle.capacity,
            motorcycle_available = lot.motorcycle.available,
            "Lot updated"
        );
        Ok(lot)
    }

    pub async fn remove(&self, lot_id: LotId) -> ParkingResult<()> {
        self.lot_repo.delete_lot(lot_id).await?;
        tracing::info!(lot_id = %lot_id, "Lot removed");
        Ok(())
    }

    /// Add `delta` (positive releases, negative takes) to a category counter
    pub async fn adjust(
        &self,
        lot_id: LotId,
        category: VehicleCategory,
        delta: i32,
    ) -> ParkingResult<Lot> {
        if delta == 0 {
            return Err(ParkingError::validation("delta must not be zero"));
        }
        let lot = self
            .lot_repo
            .adjust_available(lot_id, category, delta)
            .await?;

        tracing::info!(
            lot_id = %lot_id,
            category = %category,
            delta,
            available = lot.pool(category).available,
            "Lot counter adjusted"
        );
        Ok(lot)
    }
}
