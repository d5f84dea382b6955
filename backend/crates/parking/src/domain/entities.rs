//! Domain Entities
//!
//! Core business entities for the parking domain.

use chrono::{DateTime, Utc};
use kernel::id::{EntryId, LotId, UserId};
use serde::Serialize;

use crate::domain::value_objects::{
    EntryState, NationalId, Owner, OwnerKind, Plate, VehicleCategory,
};
use crate::error::{ParkingError, ParkingResult};

/// Slot counters for one vehicle category inside a lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPool {
    pub capacity: i32,
    pub available: i32,
}

impl SlotPool {
    pub fn new(capacity: i32, available: i32) -> ParkingResult<Self> {
        if capacity < 0 {
            return Err(ParkingError::validation("capacity must not be negative"));
        }
        if !(0..=capacity).contains(&available) {
            return Err(ParkingError::validation(
                "available slots must be between 0 and capacity",
            ));
        }
        Ok(Self {
            capacity,
            available,
        })
    }

    pub fn occupied(&self) -> i32 {
        self.capacity - self.available
    }

    /// Counter after applying `delta`, if it stays within `0..=capacity`
    pub fn adjusted(&self, delta: i32) -> Option<i32> {
        self.available
            .checked_add(delta)
            .filter(|next| (0..=self.capacity).contains(next))
    }
}

/// Lot entity - one physical parking lot with per-category counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub id: LotId,
    pub name: String,
    pub address: String,
    pub car: SlotPool,
    pub motorcycle: SlotPool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lot {
    pub fn pool(&self, category: VehicleCategory) -> &SlotPool {
        match category {
            VehicleCategory::Car => &self.car,
            VehicleCategory::Motorcycle => &self.motorcycle,
        }
    }

    pub fn pool_mut(&mut self, category: VehicleCategory) -> &mut SlotPool {
        match category {
            VehicleCategory::Car => &mut self.car,
            VehicleCategory::Motorcycle => &mut self.motorcycle,
        }
    }

    pub fn has_free_slot(&self, category: VehicleCategory) -> bool {
        self.pool(category).available > 0
    }

    /// Validate a counter change without applying it
    ///
    /// Negative deltas that would go below zero yield `NoSlotsAvailable`,
    /// positive deltas that would exceed capacity yield `SlotsOverflow`.
    pub fn check_adjustment(&self, category: VehicleCategory, delta: i32) -> ParkingResult<i32> {
        self.pool(category).adjusted(delta).ok_or(if delta < 0 {
            ParkingError::NoSlotsAvailable(category)
        } else {
            ParkingError::SlotsOverflow(category)
        })
    }

    /// Apply a counter change, leaving the lot untouched on failure
    pub fn apply_adjustment(
        &mut self,
        category: VehicleCategory,
        delta: i32,
        now: DateTime<Utc>,
    ) -> ParkingResult<()> {
        let next = self.check_adjustment(category, delta)?;
        self.pool_mut(category).available = next;
        self.updated_at = now;
        Ok(())
    }
}

/// Partial lot edit; unset fields keep their stored values
#[derive(Debug, Clone, Default)]
pub struct LotUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub car_capacity: Option<i32>,
    pub car_available: Option<i32>,
    pub motorcycle_capacity: Option<i32>,
    pub motorcycle_available: Option<i32>,
}

impl LotUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.car_capacity.is_none()
            && self.car_available.is_none()
            && self.motorcycle_capacity.is_none()
            && self.motorcycle_available.is_none()
    }
}

impl Lot {
    /// Copy of the lot with `update` applied and every field re-validated
    pub fn with_update(&self, update: &LotUpdate, now: DateTime<Utc>) -> ParkingResult<Lot> {
        let car = SlotPool::new(
            update.car_capacity.unwrap_or(self.car.capacity),
            update.car_available.unwrap_or(self.car.available),
        )?;
        let motorcycle = SlotPool::new(
            update.motorcycle_capacity.unwrap_or(self.motorcycle.capacity),
            update.motorcycle_available.unwrap_or(self.motorcycle.available),
        )?;
        let name = match &update.name {
            Some(name) => text_field("name", name, 2, 100)?,
            None => self.name.clone(),
        };
        let address = match &update.address {
            Some(address) => text_field("address", address, 2, 255)?,
            None => self.address.clone(),
        };

        Ok(Lot {
            name,
            address,
            car,
            motorcycle,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Occupied slots of `category` must cover the ACTIVE entries holding them
    pub fn check_covers_active(&self, category: VehicleCategory, active: i64) -> ParkingResult<()> {
        if i64::from(self.pool(category).occupied()) < active {
            return Err(ParkingError::SlotsInUse { category, active });
        }
        Ok(())
    }
}

/// Input for lot creation
#[derive(Debug, Clone)]
pub struct NewLot {
    pub name: String,
    pub address: String,
    pub car: SlotPool,
    pub motorcycle: SlotPool,
}

impl NewLot {
    pub fn new(
        name: &str,
        address: &str,
        car: SlotPool,
        motorcycle: SlotPool,
    ) -> ParkingResult<Self> {
        Ok(Self {
            name: text_field("name", name, 2, 100)?,
            address: text_field("address", address, 2, 255)?,
            car,
            motorcycle,
        })
    }
}

/// Vehicle entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub plate: Plate,
    pub category: VehicleCategory,
    pub owner: Owner,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    /// Only visitor vehicles carry a permit
    pub permit_expires_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    pub fn is_institutional(&self) -> bool {
        self.owner.kind() == OwnerKind::Institutional
    }

    /// Overlay the new descriptive fields, keeping old values the caller left empty
    pub fn merge_visitor_update(&mut self, update: &Vehicle) {
        self.category = update.category;
        self.owner = update.owner.clone();
        self.permit_expires_at = update.permit_expires_at;
        if update.make.is_some() {
            self.make = update.make.clone();
        }
        if update.model.is_some() {
            self.model = update.model.clone();
        }
        if update.color.is_some() {
            self.color = update.color.clone();
        }
    }
}

/// Visitor profile keyed by national id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorProfile {
    pub national_id: NationalId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl VisitorProfile {
    pub fn new(
        national_id: NationalId,
        first_name: &str,
        last_name: &str,
        phone: &str,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> ParkingResult<Self> {
        let phone = phone.trim();
        let phone_ok = (7..=20).contains(&phone.len())
            && phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
        if !phone_ok {
            return Err(ParkingError::validation(
                "phone must be 7 to 20 digits, spaces or +-() characters",
            ));
        }

        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) if is_plausible_email(e) => Some(e.to_string()),
            Some(_) => return Err(ParkingError::validation("email is not valid")),
            None => None,
        };

        Ok(Self {
            national_id,
            first_name: text_field("first name", first_name, 2, 100)?,
            last_name: text_field("last name", last_name, 2, 100)?,
            phone: phone.to_string(),
            email,
            updated_at: now,
        })
    }
}

fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Trimmed text with a character-count range
pub fn text_field(name: &str, value: &str, min: usize, max: usize) -> ParkingResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ParkingError::validation(format!(
            "{name} must be between {min} and {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Optional descriptive text; blank means absent
pub fn optional_text_field(
    name: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> ParkingResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => text_field(name, v, min, max).map(Some),
        None => Ok(None),
    }
}

/// Entry record - one stay of a vehicle in a lot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub id: EntryId,
    pub plate: Plate,
    pub operator_id: UserId,
    pub lot_id: LotId,
    /// Pool the slot was taken from; released back to the same pool
    pub category: VehicleCategory,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub state: EntryState,
    pub visit_reason: Option<String>,
}

impl EntryRecord {
    pub fn is_active(&self) -> bool {
        self.state == EntryState::Active
    }
}

/// Entry about to be opened
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub plate: Plate,
    pub operator_id: UserId,
    pub lot_id: LotId,
    pub category: VehicleCategory,
    pub entered_at: DateTime<Utc>,
    pub visit_reason: Option<String>,
}

/// Entry listing filter; set fields are combined with AND
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub state: Option<EntryState>,
    pub plate: Option<Plate>,
    pub lot_id: Option<LotId>,
    pub operator_id: Option<UserId>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &EntryRecord) -> bool {
        self.state.is_none_or(|s| entry.state == s)
            && self.plate.as_ref().is_none_or(|p| &entry.plate == p)
            && self.lot_id.is_none_or(|l| entry.lot_id == l)
            && self.operator_id.is_none_or(|o| entry.operator_id == o)
    }
}

/// Half-open time range `[from, until)` used by traffic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.until
    }
}

/// Entry and exit counts within a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrafficCount {
    pub entries: i64,
    pub exits: i64,
}
