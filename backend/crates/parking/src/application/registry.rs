//! Vehicle Registry Use Case
//!
//! Registration of institutional vehicles and lookups of vehicles and
//! visitor profiles.

use std::sync::Arc;

use crate::domain::entities::{Vehicle, VisitorProfile, optional_text_field};
use crate::domain::repository::{VehicleRepository, VisitorRepository};
use crate::domain::value_objects::{DriverCode, NationalId, Owner, Plate, VehicleCategory};
use crate::error::{ParkingError, ParkingResult};

/// Input DTO for institutional vehicle registration
#[derive(Debug, Clone)]
pub struct RegisterVehicleInput {
    pub plate: String,
    pub category: VehicleCategory,
    pub driver_code: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
}

/// Vehicle Registry Use Case
pub struct VehicleRegistryUseCase<V, S>
where
    V: VehicleRepository,
    S: VisitorRepository,
{
    vehicle_repo: Arc<V>,
    visitor_repo: Arc<S>,
}

impl<V, S> VehicleRegistryUseCase<V, S>
where
    V: VehicleRepository,
    S: VisitorRepository,
{
    pub fn new(vehicle_repo: Arc<V>, visitor_repo: Arc<S>) -> Self {
        Self {
            vehicle_repo,
            visitor_repo,
        }
    }

    pub async fn register_institutional(
        &self,
        input: RegisterVehicleInput,
    ) -> ParkingResult<Vehicle> {
        let vehicle = Vehicle {
            plate: Plate::parse(&input.plate)?,
            category: input.category,
            owner: Owner::Institutional(DriverCode::parse(&input.driver_code)?),
            make: optional_text_field("make", input.make.as_deref(), 2, 50)?,
            model: optional_text_field("model", input.model.as_deref(), 2, 50)?,
            color: optional_text_field("color", input.color.as_deref(), 2, 30)?,
            permit_expires_at: None,
        };

        let vehicle = self.vehicle_repo.register_vehicle(&vehicle).await?;
        tracing::info!(
            plate = %vehicle.plate,
            category = %vehicle.category,
            "Institutional vehicle registered"
        );
        Ok(vehicle)
    }

    pub async fn find_vehicle(&self, plate: &str) -> ParkingResult<Vehicle> {
        let plate = Plate::parse(plate)?;
        self.vehicle_repo
            .find_vehicle(&plate)
            .await?
            .ok_or_else(|| ParkingError::VehicleNotFound(plate.to_string()))
    }

    pub async fn find_visitor(&self, national_id: &str) -> ParkingResult<VisitorProfile> {
        let national_id = NationalId::parse(national_id)?;
        self.visitor_repo
            .find_visitor(&national_id)
            .await?
            .ok_or_else(|| ParkingError::VisitorNotFound(national_id.to_string()))
    }
}
