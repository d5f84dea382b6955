//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the infra layer.
//! Every operation that touches both an entry and a lot counter is a single
//! atomic unit inside the implementation.

use chrono::{DateTime, Utc};
use kernel::id::{EntryId, LotId, UserId};

use crate::domain::entities::{
    EntryFilter, EntryRecord, Lot, LotUpdate, NewEntry, NewLot, TimeWindow, TrafficCount,
    Vehicle, VisitorProfile,
};
use crate::domain::value_objects::{NationalId, Owner, OwnerKind, Plate, VehicleCategory};
use crate::error::ParkingResult;

/// Vehicle registry
#[trait_variant::make(VehicleRepository: Send)]
pub trait LocalVehicleRepository {
    async fn find_vehicle(&self, plate: &Plate) -> ParkingResult<Option<Vehicle>>;

    /// Register a new vehicle; fails with `VehicleAlreadyRegistered` on a taken plate
    async fn register_vehicle(&self, vehicle: &Vehicle) -> ParkingResult<Vehicle>;

    /// Create or refresh a visitor vehicle
    ///
    /// Fails with `PlateIsInstitutional` when the plate belongs to an
    /// institutional owner. Empty descriptors keep their stored values.
    async fn upsert_visitor_vehicle(&self, vehicle: &Vehicle) -> ParkingResult<Vehicle>;
}

/// Operator (staff user) lookup; existence check only
#[trait_variant::make(OperatorDirectory: Send)]
pub trait LocalOperatorDirectory {
    async fn operator_exists(&self, operator_id: UserId) -> ParkingResult<bool>;
}

/// Lot registry and slot counters
#[trait_variant::make(LotRepository: Send)]
pub trait LocalLotRepository {
    async fn create_lot(&self, lot: &NewLot) -> ParkingResult<Lot>;

    async fn find_lot(&self, lot_id: LotId) -> ParkingResult<Option<Lot>>;

    async fn list_lots(&self) -> ParkingResult<Vec<Lot>>;

    /// Apply `update` under a lock on the lot row
    ///
    /// Besides the `0..=capacity` bounds, the occupied slots of each category
    /// must still cover the ACTIVE entries of that category, otherwise
    /// `SlotsInUse`.
    async fn update_lot(&self, lot_id: LotId, update: &LotUpdate) -> ParkingResult<Lot>;

    /// Delete a lot; fails with `LotInUse` while entry records reference it
    async fn delete_lot(&self, lot_id: LotId) -> ParkingResult<()>;

    /// Atomically add `delta` to the category counter
    ///
    /// The change is rejected, and nothing written, when the result would
    /// leave `0..=capacity`.
    async fn adjust_available(
        &self,
        lot_id: LotId,
        category: VehicleCategory,
        delta: i32,
    ) -> ParkingResult<Lot>;
}

/// Entry records
#[trait_variant::make(EntryRepository: Send)]
pub trait LocalEntryRepository {
    async fn find_entry(&self, entry_id: EntryId) -> ParkingResult<Option<EntryRecord>>;

    async fn find_active_by_plate(&self, plate: &Plate) -> ParkingResult<Option<EntryRecord>>;

    /// ACTIVE entry at `lot_id` for any vehicle owned by `owner`
    async fn find_active_by_owner(
        &self,
        owner: &Owner,
        lot_id: LotId,
    ) -> ParkingResult<Option<EntryRecord>>;

    /// Newest first
    async fn list_entries(&self, filter: &EntryFilter) -> ParkingResult<Vec<EntryRecord>>;

    /// ACTIVE entries with the owner kind of their vehicle, newest first
    async fn list_active_with_owner_kind(&self) -> ParkingResult<Vec<(EntryRecord, OwnerKind)>>;

    /// Insert an ACTIVE entry and take one slot of `entry.category`, all or nothing
    ///
    /// Fails with `ActiveEntryExists` when the plate already has an ACTIVE
    /// entry and with `NoSlotsAvailable` when the counter is at zero.
    async fn open_entry(&self, entry: &NewEntry) -> ParkingResult<EntryRecord>;

    /// Close an ACTIVE entry and release its slot, all or nothing
    ///
    /// The slot goes back to the category stored on the entry. A counter
    /// already at capacity yields `Consistency` and leaves the entry ACTIVE.
    async fn close_entry(
        &self,
        entry_id: EntryId,
        exited_at: DateTime<Utc>,
    ) -> ParkingResult<EntryRecord>;

    /// Delete an entry, releasing its slot first when it was still ACTIVE
    ///
    /// Returns whether a slot was released.
    async fn delete_entry(&self, entry_id: EntryId) -> ParkingResult<bool>;
}

/// Visitor profiles
#[trait_variant::make(VisitorRepository: Send)]
pub trait LocalVisitorRepository {
    /// Insert, or overwrite name, phone and email of an existing profile
    async fn upsert_visitor(&self, profile: &VisitorProfile) -> ParkingResult<VisitorProfile>;

    async fn find_visitor(&self, national_id: &NationalId)
    -> ParkingResult<Option<VisitorProfile>>;
}

/// Aggregated traffic counts
#[trait_variant::make(TrafficRepository: Send)]
pub trait LocalTrafficRepository {
    /// Entries started and exits recorded inside `window`
    async fn count_traffic(
        &self,
        window: TimeWindow,
        category: Option<VehicleCategory>,
    ) -> ParkingResult<TrafficCount>;
}

/// Everything the HTTP layer needs from one store
pub trait ParkingStore:
    VehicleRepository
    + OperatorDirectory
    + LotRepository
    + EntryRepository
    + VisitorRepository
    + TrafficRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> ParkingStore for T where
    T: VehicleRepository
        + OperatorDirectory
        + LotRepository
        + EntryRepository
        + VisitorRepository
        + TrafficRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
