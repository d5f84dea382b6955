//! In-memory Repository
//!
//! Process-local store behind one mutex. Each repository call takes the lock
//! once, so the paired entry/counter writes are atomic with respect to other
//! calls. Used by tests and by deployments without a database.

use chrono::{DateTime, Utc};
use kernel::id::{EntryId, LotId, UserId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::entities::{
    EntryFilter, EntryRecord, Lot, LotUpdate, NewEntry, NewLot, TimeWindow, TrafficCount,
    Vehicle, VisitorProfile,
};
use crate::domain::repository::{
    EntryRepository, LotRepository, OperatorDirectory, TrafficRepository, VehicleRepository,
    VisitorRepository,
};
use crate::domain::value_objects::{
    EntryState, NationalId, Owner, OwnerKind, Plate, VehicleCategory,
};
use crate::error::{ParkingError, ParkingResult};

/// Mutex-backed repository; clones share the same store
#[derive(Debug, Clone, Default)]
pub struct InMemoryParkingRepository {
    inner: Arc<Mutex<MemoryStore>>,
}

#[derive(Debug, Default)]
struct MemoryStore {
    operators: HashSet<UserId>,
    lots: BTreeMap<LotId, Lot>,
    vehicles: HashMap<Plate, Vehicle>,
    visitors: HashMap<NationalId, VisitorProfile>,
    entries: BTreeMap<EntryId, EntryRecord>,
    next_lot_id: i64,
    next_entry_id: i64,
}

impl MemoryStore {
    fn active_by_plate(&self, plate: &Plate) -> Option<&EntryRecord> {
        self.entries
            .values()
            .find(|e| e.is_active() && &e.plate == plate)
    }

    fn active_count(&self, lot_id: LotId, category: VehicleCategory) -> i64 {
        self.entries
            .values()
            .filter(|e| e.is_active() && e.lot_id == lot_id && e.category == category)
            .count() as i64
    }

    fn owner_kind_of(&self, plate: &Plate) -> Option<OwnerKind> {
        self.vehicles.get(plate).map(|v| v.owner.kind())
    }

    fn release_slot(
        &mut self,
        entry_id: EntryId,
        lot_id: LotId,
        category: VehicleCategory,
        now: DateTime<Utc>,
    ) -> ParkingResult<()> {
        let lot = self
            .lots
            .get_mut(&lot_id)
            .ok_or(ParkingError::LotNotFound(lot_id))?;
        match lot.apply_adjustment(category, 1, now) {
            Err(ParkingError::SlotsOverflow(_)) => {
                tracing::error!(
                    entry_id = %entry_id,
                    lot_id = %lot_id,
                    category = %category,
                    "Releasing slot would exceed lot capacity"
                );
                Err(ParkingError::Consistency(format!(
                    "lot {lot_id} has no occupied {category} slot for entry {entry_id}"
                )))
            }
            other => other,
        }
    }
}

impl InMemoryParkingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator id as existing
    pub fn add_operator(&self, operator_id: UserId) -> ParkingResult<()> {
        self.lock()?.operators.insert(operator_id);
        Ok(())
    }

    fn lock(&self) -> ParkingResult<MutexGuard<'_, MemoryStore>> {
        self.inner
            .lock()
            .map_err(|_| ParkingError::Internal("parking store lock poisoned".to_string()))
    }
}

impl VehicleRepository for InMemoryParkingRepository {
    async fn find_vehicle(&self, plate: &Plate) -> ParkingResult<Option<Vehicle>> {
        Ok(self.lock()?.vehicles.get(plate).cloned())
    }

    async fn register_vehicle(&self, vehicle: &Vehicle) -> ParkingResult<Vehicle> {
        let mut store = self.lock()?;
        if store.vehicles.contains_key(&vehicle.plate) {
            return Err(ParkingError::VehicleAlreadyRegistered(
                vehicle.plate.to_string(),
            ));
        }
        store
            .vehicles
            .insert(vehicle.plate.clone(), vehicle.clone());
        Ok(vehicle.clone())
    }

    async fn upsert_visitor_vehicle(&self, vehicle: &Vehicle) -> ParkingResult<Vehicle> {
        let mut store = self.lock()?;
        match store.vehicles.get_mut(&vehicle.plate) {
            Some(existing) if existing.is_institutional() => Err(
                ParkingError::PlateIsInstitutional(vehicle.plate.to_string()),
            ),
            Some(existing) => {
                existing.merge_visitor_update(vehicle);
                Ok(existing.clone())
            }
            None => {
                store
                    .vehicles
                    .insert(vehicle.plate.clone(), vehicle.clone());
                Ok(vehicle.clone())
            }
        }
    }
}

impl OperatorDirectory for InMemoryParkingRepository {
    async fn operator_exists(&self, operator_id: UserId) -> ParkingResult<bool> {
        Ok(self.lock()?.operators.contains(&operator_id))
    }
}

impl LotRepository for InMemoryParkingRepository {
    async fn create_lot(&self, lot: &NewLot) -> ParkingResult<Lot> {
        let mut store = self.lock()?;
        store.next_lot_id += 1;
        let now = Utc::now();
        let created = Lot {
            id: LotId::new(store.next_lot_id),
            name: lot.name.clone(),
            address: lot.address.clone(),
            car: lot.car,
            motorcycle: lot.motorcycle,
            created_at: now,
            updated_at: now,
        };
        store.lots.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_lot(&self, lot_id: LotId) -> ParkingResult<Option<Lot>> {
        Ok(self.lock()?.lots.get(&lot_id).cloned())
    }

    async fn list_lots(&self) -> ParkingResult<Vec<Lot>> {
        Ok(self.lock()?.lots.values().cloned().collect())
    }

    async fn update_lot(&self, lot_id: LotId, update: &LotUpdate) -> ParkingResult<Lot> {
        let mut store = self.lock()?;
        let updated = store
            .lots
            .get(&lot_id)
            .ok_or(ParkingError::LotNotFound(lot_id))?
            .with_update(update, Utc::now())?;
        for category in [VehicleCategory::Car, VehicleCategory::Motorcycle] {
            updated.check_covers_active(category, store.active_count(lot_id, category))?;
        }
        store.lots.insert(lot_id, updated.clone());
        Ok(updated)
    }

    async fn delete_lot(&self, lot_id: LotId) -> ParkingResult<()> {
        let mut store = self.lock()?;
        if !store.lots.contains_key(&lot_id) {
            return Err(ParkingError::LotNotFound(lot_id));
        }
        if store.entries.values().any(|e| e.lot_id == lot_id) {
            return Err(ParkingError::LotInUse(lot_id));
        }
        store.lots.remove(&lot_id);
        Ok(())
    }

    async fn adjust_available(
        &self,
        lot_id: LotId,
        category: VehicleCategory,
        delta: i32,
    ) -> ParkingResult<Lot> {
        let mut store = self.lock()?;
        let lot = store
            .lots
            .get_mut(&lot_id)
            .ok_or(ParkingError::LotNotFound(lot_id))?;
        lot.apply_adjustment(category, delta, Utc::now())?;
        Ok(lot.clone())
    }
}

impl EntryRepository for InMemoryParkingRepository {
    async fn find_entry(&self, entry_id: EntryId) -> ParkingResult<Option<EntryRecord>> {
        Ok(self.lock()?.entries.get(&entry_id).cloned())
    }

    async fn find_active_by_plate(&self, plate: &Plate) -> ParkingResult<Option<EntryRecord>> {
        Ok(self.lock()?.active_by_plate(plate).cloned())
    }

    async fn find_active_by_owner(
        &self,
        owner: &Owner,
        lot_id: LotId,
    ) -> ParkingResult<Option<EntryRecord>> {
        let store = self.lock()?;
        Ok(store
            .entries
            .values()
            .rev()
            .find(|e| {
                e.is_active()
                    && e.lot_id == lot_id
                    && store
                        .vehicles
                        .get(&e.plate)
                        .is_some_and(|v| &v.owner == owner)
            })
            .cloned())
    }

    async fn list_entries(&self, filter: &EntryFilter) -> ParkingResult<Vec<EntryRecord>> {
        let store = self.lock()?;
        let mut entries: Vec<EntryRecord> = store
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entered_at.cmp(&a.entered_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn list_active_with_owner_kind(&self) -> ParkingResult<Vec<(EntryRecord, OwnerKind)>> {
        let store = self.lock()?;
        let mut rows = store
            .entries
            .values()
            .filter(|e| e.is_active())
            .map(|e| {
                let kind = store.owner_kind_of(&e.plate).ok_or_else(|| {
                    ParkingError::Consistency(format!("entry {} has no vehicle", e.id))
                })?;
                Ok((e.clone(), kind))
            })
            .collect::<ParkingResult<Vec<_>>>()?;
        rows.sort_by(|(a, _), (b, _)| b.entered_at.cmp(&a.entered_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn open_entry(&self, entry: &NewEntry) -> ParkingResult<EntryRecord> {
        let mut store = self.lock()?;

        if !store.vehicles.contains_key(&entry.plate) {
            return Err(ParkingError::VehicleNotFound(entry.plate.to_string()));
        }
        if !store.operators.contains(&entry.operator_id) {
            return Err(ParkingError::OperatorNotFound(entry.operator_id));
        }
        if store.active_by_plate(&entry.plate).is_some() {
            return Err(ParkingError::ActiveEntryExists(entry.plate.to_string()));
        }
        let lot = store
            .lots
            .get_mut(&entry.lot_id)
            .ok_or(ParkingError::LotNotFound(entry.lot_id))?;
        lot.apply_adjustment(entry.category, -1, entry.entered_at)?;

        store.next_entry_id += 1;
        let record = EntryRecord {
            id: EntryId::new(store.next_entry_id),
            plate: entry.plate.clone(),
            operator_id: entry.operator_id,
            lot_id: entry.lot_id,
            category: entry.category,
            entered_at: entry.entered_at,
            exited_at: None,
            state: EntryState::Active,
            visit_reason: entry.visit_reason.clone(),
        };
        store.entries.insert(record.id, record.clone());
        Ok(record)
    }

    async fn close_entry(
        &self,
        entry_id: EntryId,
        exited_at: DateTime<Utc>,
    ) -> ParkingResult<EntryRecord> {
        let mut store = self.lock()?;

        let (lot_id, category, active) = store
            .entries
            .get(&entry_id)
            .map(|e| (e.lot_id, e.category, e.is_active()))
            .ok_or(ParkingError::EntryNotFound(entry_id))?;
        if !active {
            return Err(ParkingError::EntryAlreadyClosed(entry_id));
        }

        // Counter first: on failure the entry stays ACTIVE
        store.release_slot(entry_id, lot_id, category, exited_at)?;

        let entry = store
            .entries
            .get_mut(&entry_id)
            .ok_or(ParkingError::EntryNotFound(entry_id))?;
        entry.state = EntryState::Closed;
        entry.exited_at = Some(exited_at);
        Ok(entry.clone())
    }

    async fn delete_entry(&self, entry_id: EntryId) -> ParkingResult<bool> {
        let mut store = self.lock()?;

        let (lot_id, category, active) = store
            .entries
            .get(&entry_id)
            .map(|e| (e.lot_id, e.category, e.is_active()))
            .ok_or(ParkingError::EntryNotFound(entry_id))?;
        if active {
            store.release_slot(entry_id, lot_id, category, Utc::now())?;
        }
        store.entries.remove(&entry_id);
        Ok(active)
    }
}

impl VisitorRepository for InMemoryParkingRepository {
    async fn upsert_visitor(&self, profile: &VisitorProfile) -> ParkingResult<VisitorProfile> {
        let mut store = self.lock()?;
        store
            .visitors
            .insert(profile.national_id.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn find_visitor(
        &self,
        national_id: &NationalId,
    ) -> ParkingResult<Option<VisitorProfile>> {
        Ok(self.lock()?.visitors.get(national_id).cloned())
    }
}

impl TrafficRepository for InMemoryParkingRepository {
    async fn count_traffic(
        &self,
        window: TimeWindow,
        category: Option<VehicleCategory>,
    ) -> ParkingResult<TrafficCount> {
        let store = self.lock()?;
        let mut count = TrafficCount::default();
        for entry in store.entries.values() {
            if category.is_some_and(|c| entry.category != c) {
                continue;
            }
            if window.contains(entry.entered_at) {
                count.entries += 1;
            }
            if entry.exited_at.is_some_and(|at| window.contains(at)) {
                count.exits += 1;
            }
        }
        Ok(count)
    }
}
