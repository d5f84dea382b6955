//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{EntryId, LotId, UserId};
use serde::{Deserialize, Serialize};

use crate::application::query_entries::ActiveEntries;
use crate::application::traffic_report::{TrafficPeriod, TrafficReport};
use crate::domain::entities::{
    EntryFilter, EntryRecord, Lot, LotUpdate, SlotPool, Vehicle, VisitorProfile,
};
use crate::domain::value_objects::{EntryState, OwnerKind, Plate, VehicleCategory};
use crate::error::{ParkingError, ParkingResult};

// ============================================================================
// Restriction
// ============================================================================

/// Request for POST /api/pico-placa/check
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRestrictionRequest {
    pub plate: String,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

// ============================================================================
// Lots
// ============================================================================

/// Request for POST /api/lots
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLotRequest {
    pub name: String,
    pub address: String,
    pub car_capacity: i32,
    #[serde(default)]
    pub car_available: Option<i32>,
    pub motorcycle_capacity: i32,
    #[serde(default)]
    pub motorcycle_available: Option<i32>,
}

/// Request for PATCH /api/lots/{lot_id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateLotRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub car_capacity: Option<i32>,
    #[serde(default)]
    pub car_available: Option<i32>,
    #[serde(default)]
    pub motorcycle_capacity: Option<i32>,
    #[serde(default)]
    pub motorcycle_available: Option<i32>,
}

impl From<UpdateLotRequest> for LotUpdate {
    fn from(req: UpdateLotRequest) -> Self {
        Self {
            name: req.name,
            address: req.address,
            car_capacity: req.car_capacity,
            car_available: req.car_available,
            motorcycle_capacity: req.motorcycle_capacity,
            motorcycle_available: req.motorcycle_available,
        }
    }
}

/// Request for PATCH /api/lots/{lot_id}/slots
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustSlotsRequest {
    pub category: VehicleCategory,
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotResponse {
    pub id: LotId,
    pub name: String,
    pub address: String,
    pub car: SlotPool,
    pub motorcycle: SlotPool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lot> for LotResponse {
    fn from(lot: Lot) -> Self {
        Self {
            id: lot.id,
            name: lot.name,
            address: lot.address,
            car: lot.car,
            motorcycle: lot.motorcycle,
            created_at: lot.created_at,
            updated_at: lot.updated_at,
        }
    }
}

// ============================================================================
// Vehicles / visitors
// ============================================================================

/// Request for POST /api/vehicles
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVehicleRequest {
    pub plate: String,
    pub category: VehicleCategory,
    pub driver_code: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub plate: Plate,
    pub category: VehicleCategory,
    pub owner_kind: OwnerKind,
    pub owner_reference: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub permit_expires_at: Option<DateTime<Utc>>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            owner_kind: vehicle.owner.kind(),
            owner_reference: vehicle.owner.reference().to_string(),
            plate: vehicle.plate,
            category: vehicle.category,
            make: vehicle.make,
            model: vehicle.model,
            color: vehicle.color,
            permit_expires_at: vehicle.permit_expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorResponse {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<VisitorProfile> for VisitorResponse {
    fn from(profile: VisitorProfile) -> Self {
        Self {
            national_id: profile.national_id.to_string(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            email: profile.email,
            updated_at: profile.updated_at,
        }
    }
}

/// Visitor identity block of POST /api/visitors/entries
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorProfileDto {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Vehicle block of POST /api/visitors/entries
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorVehicleDto {
    pub plate: String,
    pub category: VehicleCategory,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub permit_expires_at: DateTime<Utc>,
}

/// Request for POST /api/visitors/entries
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVisitorRequest {
    pub visitor: VisitorProfileDto,
    pub vehicle: VisitorVehicleDto,
    pub lot_id: LotId,
    pub operator_id: UserId,
    pub visit_reason: String,
}

// ============================================================================
// Entries
// ============================================================================

/// Request for POST /api/entries
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmitRequest {
    pub plate: String,
    pub operator_id: UserId,
    pub lot_id: LotId,
}

/// Query for the exit endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitQuery {
    #[serde(default)]
    pub exited_at: Option<DateTime<Utc>>,
}

/// Query for GET /api/entries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryListQuery {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub lot_id: Option<LotId>,
    #[serde(default)]
    pub operator_id: Option<UserId>,
}

impl EntryListQuery {
    pub fn into_filter(self) -> ParkingResult<EntryFilter> {
        let state = self
            .state
            .map(|s| {
                EntryState::from_code(&s)
                    .ok_or_else(|| ParkingError::validation(format!("unknown entry state {s}")))
            })
            .transpose()?;
        let plate = self.plate.as_deref().map(Plate::parse).transpose()?;
        Ok(EntryFilter {
            state,
            plate,
            lot_id: self.lot_id,
            operator_id: self.operator_id,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: EntryId,
    pub plate: Plate,
    pub operator_id: UserId,
    pub lot_id: LotId,
    pub category: VehicleCategory,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub state: EntryState,
    pub visit_reason: Option<String>,
}

impl From<EntryRecord> for EntryResponse {
    fn from(entry: EntryRecord) -> Self {
        Self {
            id: entry.id,
            plate: entry.plate,
            operator_id: entry.operator_id,
            lot_id: entry.lot_id,
            category: entry.category,
            entered_at: entry.entered_at,
            exited_at: entry.exited_at,
            state: entry.state,
            visit_reason: entry.visit_reason,
        }
    }
}

/// Response for GET /api/entries/active
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEntriesResponse {
    pub institutional: Vec<EntryResponse>,
    pub visitor: Vec<EntryResponse>,
    pub total: usize,
}

impl From<ActiveEntries> for ActiveEntriesResponse {
    fn from(active: ActiveEntries) -> Self {
        let total = active.total();
        Self {
            institutional: active.institutional.into_iter().map(Into::into).collect(),
            visitor: active.visitor.into_iter().map(Into::into).collect(),
            total,
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Query for GET /api/reports/traffic
///
/// Exactly one of `day`, `from`+`to` or `year`+`month` selects the period.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficQuery {
    #[serde(default)]
    pub day: Option<NaiveDate>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TrafficQuery {
    pub fn period(&self) -> ParkingResult<TrafficPeriod> {
        match (self.day, self.from, self.to, self.year, self.month) {
            (Some(day), None, None, None, None) => Ok(TrafficPeriod::Day(day)),
            (None, Some(from), Some(to), None, None) => Ok(TrafficPeriod::Range { from, to }),
            (None, None, None, Some(year), Some(month)) => Ok(TrafficPeriod::Month { year, month }),
            _ => Err(ParkingError::validation(
                "select exactly one period: day, from+to, or year+month",
            )),
        }
    }

    pub fn category(&self) -> ParkingResult<Option<VehicleCategory>> {
        self.category
            .as_deref()
            .map(|c| {
                VehicleCategory::from_code(c)
                    .ok_or_else(|| ParkingError::validation(format!("unknown category {c}")))
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReportResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub category: Option<VehicleCategory>,
    pub entries: i64,
    pub exits: i64,
}

impl From<TrafficReport> for TrafficReportResponse {
    fn from(report: TrafficReport) -> Self {
        Self {
            from: report.from,
            to: report.to,
            category: report.category,
            entries: report.count.entries,
            exits: report.count.exits,
        }
    }
}
