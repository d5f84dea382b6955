//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::{EntryId, LotId};
use std::sync::Arc;

use crate::application::admit_vehicle::{AdmitVehicleInput, AdmitVehicleUseCase};
use crate::application::check_restriction::CheckRestrictionUseCase;
use crate::application::close_entry::CloseEntryUseCase;
use crate::application::config::ParkingConfig;
use crate::application::occupancy::{CreateLotInput, LotOccupancy};
use crate::application::query_entries::EntryQueryUseCase;
use crate::application::register_visitor::{
    RegisterVisitorInput, RegisterVisitorUseCase, VisitorProfileInput, VisitorVehicleInput,
};
use crate::application::registry::{RegisterVehicleInput, VehicleRegistryUseCase};
use crate::application::traffic_report::TrafficReportUseCase;
use crate::domain::repository::ParkingStore;
use crate::domain::restriction::{RestrictionCalendar, RestrictionVerdict};
use crate::error::ParkingResult;
use crate::presentation::dto::{
    ActiveEntriesResponse, AdjustSlotsRequest, AdmitRequest, CheckRestrictionRequest,
    CreateLotRequest, EntryListQuery, EntryResponse, ExitQuery, LotResponse,
    RegisterVehicleRequest, RegisterVisitorRequest, TrafficQuery, TrafficReportResponse,
    UpdateLotRequest, VehicleResponse, VisitorResponse,
};

/// Shared state for parking handlers
#[derive(Clone)]
pub struct ParkingAppState<R>
where
    R: ParkingStore,
{
    pub repo: Arc<R>,
    pub config: Arc<ParkingConfig>,
    pub calendar: RestrictionCalendar,
}

impl<R> ParkingAppState<R>
where
    R: ParkingStore,
{
    pub fn new(repo: R, config: ParkingConfig) -> Self {
        let calendar = config.calendar();
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            calendar,
        }
    }
}

// ============================================================================
// Restriction
// ============================================================================

/// POST /api/pico-placa/check
pub async fn check_restriction<R>(
    State(state): State<ParkingAppState<R>>,
    Json(req): Json<CheckRestrictionRequest>,
) -> ParkingResult<Json<RestrictionVerdict>>
where
    R: ParkingStore,
{
    let use_case = CheckRestrictionUseCase::new(state.calendar);
    Ok(Json(use_case.execute(&req.plate, req.at)?))
}

// ============================================================================
// Lots
// ============================================================================

/// GET /api/lots
pub async fn list_lots<R>(
    State(state): State<ParkingAppState<R>>,
) -> ParkingResult<Json<Vec<LotResponse>>>
where
    R: ParkingStore,
{
    let lots = LotOccupancy::new(state.repo.clone()).list().await?;
    Ok(Json(lots.into_iter().map(Into::into).collect()))
}

/// POST /api/lots
pub async fn create_lot<R>(
    State(state): State<ParkingAppState<R>>,
    Json(req): Json<CreateLotRequest>,
) -> ParkingResult<(StatusCode, Json<LotResponse>)>
where
    R: ParkingStore,
{
    let input = CreateLotInput {
        name: req.name,
        address: req.address,
        car_capacity: req.car_capacity,
        car_available: req.car_available,
        motorcycle_capacity: req.motorcycle_capacity,
        motorcycle_available: req.motorcycle_available,
    };
    let lot = LotOccupancy::new(state.repo.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(lot.into())))
}

/// GET /api/lots/{lot_id}
pub async fn get_lot<R>(
    State(state): State<ParkingAppState<R>>,
    Path(lot_id): Path<LotId>,
) -> ParkingResult<Json<LotResponse>>
where
    R: ParkingStore,
{
    let lot = LotOccupancy::new(state.repo.clone()).get(lot_id).await?;
    Ok(Json(lot.into()))
}

/// PATCH /api/lots/{lot_id}
pub async fn update_lot<R>(
    State(state): State<ParkingAppState<R>>,
    Path(lot_id): Path<LotId>,
    Json(req): Json<UpdateLotRequest>,
) -> ParkingResult<Json<LotResponse>>
where
    R: ParkingStore,
{
    let lot = LotOccupancy::new(state.repo.clone())
        .update(lot_id, req.into())
        .await?;
    Ok(Json(lot.into()))
}

/// DELETE /api/lots/{lot_id}
pub async fn remove_lot<R>(
    State(state): State<ParkingAppState<R>>,
    Path(lot_id): Path<LotId>,
) -> ParkingResult<StatusCode>
where
    R: ParkingStore,
{
    LotOccupancy::new(state.repo.clone()).remove(lot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/lots/{lot_id}/slots
pub async fn adjust_slots<R>(
    State(state): State<ParkingAppState<R>>,
    Path(lot_id): Path<LotId>,
    Json(req): Json<AdjustSlotsRequest>,
) -> ParkingResult<Json<LotResponse>>
where
    R: ParkingStore,
{
    let lot = LotOccupancy::new(state.repo.clone())
        .adjust(lot_id, req.category, req.delta)
        .await?;
    Ok(Json(lot.into()))
}

// ============================================================================
// Vehicles / visitors
// ============================================================================

/// POST /api/vehicles
pub async fn register_vehicle<R>(
    State(state): State<ParkingAppState<R>>,
    Json(req): Json<RegisterVehicleRequest>,
) -> ParkingResult<(StatusCode, Json<VehicleResponse>)>
where
    R: ParkingStore,
{
    let use_case = VehicleRegistryUseCase::new(state.repo.clone(), state.repo.clone());
    let vehicle = use_case
        .register_institutional(RegisterVehicleInput {
            plate: req.plate,
            category: req.category,
            driver_code: req.driver_code,
            make: req.make,
            model: req.model,
            color: req.color,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(vehicle.into())))
}

/// GET /api/vehicles/{plate}
pub async fn get_vehicle<R>(
    State(state): State<ParkingAppState<R>>,
    Path(plate): Path<String>,
) -> ParkingResult<Json<VehicleResponse>>
where
    R: ParkingStore,
{
    let use_case = VehicleRegistryUseCase::new(state.repo.clone(), state.repo.clone());
    Ok(Json(use_case.find_vehicle(&plate).await?.into()))
}

/// GET /api/visitors/{national_id}
pub async fn get_visitor<R>(
    State(state): State<ParkingAppState<R>>,
    Path(national_id): Path<String>,
) -> ParkingResult<Json<VisitorResponse>>
where
    R: ParkingStore,
{
    let use_case = VehicleRegistryUseCase::new(state.repo.clone(), state.repo.clone());
    Ok(Json(use_case.find_visitor(&national_id).await?.into()))
}

/// POST /api/visitors/entries
pub async fn register_visitor<R>(
    State(state): State<ParkingAppState<R>>,
    Json(req): Json<RegisterVisitorRequest>,
) -> ParkingResult<(StatusCode, Json<EntryResponse>)>
where
    R: ParkingStore,
{
    let use_case = RegisterVisitorUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.calendar,
    );

    let input = RegisterVisitorInput {
        visitor: VisitorProfileInput {
            national_id: req.visitor.national_id,
            first_name: req.visitor.first_name,
            last_name: req.visitor.last_name,
            phone: req.visitor.phone,
            email: req.visitor.email,
        },
        vehicle: VisitorVehicleInput {
            plate: req.vehicle.plate,
            category: req.vehicle.category,
            make: req.vehicle.make,
            model: req.vehicle.model,
            color: req.vehicle.color,
            permit_expires_at: req.vehicle.permit_expires_at,
        },
        lot_id: req.lot_id,
        operator_id: req.operator_id,
        visit_reason: req.visit_reason,
    };

    let entry = use_case.execute(input).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

// ============================================================================
// Entries
// ============================================================================

/// POST /api/entries
pub async fn admit_vehicle<R>(
    State(state): State<ParkingAppState<R>>,
    Json(req): Json<AdmitRequest>,
) -> ParkingResult<(StatusCode, Json<EntryResponse>)>
where
    R: ParkingStore,
{
    let use_case = AdmitVehicleUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.calendar,
    );

    let entry = use_case
        .execute(AdmitVehicleInput {
            plate: req.plate,
            operator_id: req.operator_id,
            lot_id: req.lot_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /api/entries
pub async fn list_entries<R>(
    State(state): State<ParkingAppState<R>>,
    Query(query): Query<EntryListQuery>,
) -> ParkingResult<Json<Vec<EntryResponse>>>
where
    R: ParkingStore,
{
    let filter = query.into_filter()?;
    let entries = EntryQueryUseCase::new(state.repo.clone())
        .list(&filter)
        .await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// GET /api/entries/active
pub async fn active_entries<R>(
    State(state): State<ParkingAppState<R>>,
) -> ParkingResult<Json<ActiveEntriesResponse>>
where
    R: ParkingStore,
{
    let active = EntryQueryUseCase::new(state.repo.clone()).active().await?;
    Ok(Json(active.into()))
}

/// GET /api/entries/{entry_id}
pub async fn get_entry<R>(
    State(state): State<ParkingAppState<R>>,
    Path(entry_id): Path<EntryId>,
) -> ParkingResult<Json<EntryResponse>>
where
    R: ParkingStore,
{
    let entry = EntryQueryUseCase::new(state.repo.clone())
        .get(entry_id)
        .await?;
    Ok(Json(entry.into()))
}

/// PATCH /api/entries/{entry_id}/exit
pub async fn close_entry<R>(
    State(state): State<ParkingAppState<R>>,
    Path(entry_id): Path<EntryId>,
    Query(query): Query<ExitQuery>,
) -> ParkingResult<Json<EntryResponse>>
where
    R: ParkingStore,
{
    let use_case = CloseEntryUseCase::new(state.repo.clone());
    let entry = use_case.close(entry_id, query.exited_at).await?;
    Ok(Json(entry.into()))
}

/// PATCH /api/entries/plate/{plate}/exit
pub async fn close_entry_by_plate<R>(
    State(state): State<ParkingAppState<R>>,
    Path(plate): Path<String>,
    Query(query): Query<ExitQuery>,
) -> ParkingResult<Json<EntryResponse>>
where
    R: ParkingStore,
{
    let use_case = CloseEntryUseCase::new(state.repo.clone());
    let entry = use_case.close_by_plate(&plate, query.exited_at).await?;
    Ok(Json(entry.into()))
}

/// DELETE /api/entries/{entry_id}
pub async fn remove_entry<R>(
    State(state): State<ParkingAppState<R>>,
    Path(entry_id): Path<EntryId>,
) -> ParkingResult<StatusCode>
where
    R: ParkingStore,
{
    let use_case = CloseEntryUseCase::new(state.repo.clone());
    use_case.remove(entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Reports
// ============================================================================

/// GET /api/reports/traffic
pub async fn traffic_report<R>(
    State(state): State<ParkingAppState<R>>,
    Query(query): Query<TrafficQuery>,
) -> ParkingResult<Json<TrafficReportResponse>>
where
    R: ParkingStore,
{
    let period = query.period()?;
    let category = query.category()?;
    let report = TrafficReportUseCase::new(state.repo.clone(), state.config.utc_offset)
        .execute(period, category)
        .await?;
    Ok(Json(report.into()))
}
