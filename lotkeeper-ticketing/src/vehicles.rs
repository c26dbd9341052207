use std::sync::Arc;

use lotkeeper_core::{authorize, Capability, LotError, LotResult, Repositories};
use lotkeeper_shared::models::records::normalize_plate;
use lotkeeper_shared::{Vehicle, VehicleType};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::users::resolve_actor;

/// Vehicles known to the lot, unique by normalized plate
#[derive(Clone)]
pub struct VehicleRegistry {
    repos: Repositories,
    registration: Arc<Mutex<()>>,
}

impl VehicleRegistry {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            registration: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_vehicle(&self, id: Uuid) -> LotResult<Vehicle> {
        self.repos
            .vehicles
            .get_vehicle(id)
            .await?
            .ok_or_else(|| LotError::not_found("Vehicle", id))
    }

    pub async fn find_by_plate(&self, plate: &str) -> LotResult<Option<Vehicle>> {
        self.repos.vehicles.find_by_plate(&normalize_plate(plate)).await
    }

    /// Sorted by plate
    pub async fn list_vehicles(&self) -> LotResult<Vec<Vehicle>> {
        let mut vehicles = self.repos.vehicles.list_vehicles().await?;
        vehicles.sort_by(|a, b| a.plate_number.cmp(&b.plate_number));
        Ok(vehicles)
    }

    /// Existing vehicle for the plate, or a newly registered one.
    /// An existing record keeps its type.
    pub async fn ensure_vehicle(&self, plate: &str, vehicle_type: VehicleType) -> LotResult<Vehicle> {
        let plate = normalize_plate(plate);
        if plate.is_empty() {
            return Err(LotError::Validation("plate number must not be empty".into()));
        }

        let _registering = self.registration.lock().await;
        if let Some(existing) = self.repos.vehicles.find_by_plate(&plate).await? {
            return Ok(existing);
        }

        let vehicle = Vehicle::new(&plate, vehicle_type);
        self.repos.vehicles.save_vehicle(&vehicle).await?;
        info!(vehicle_id = %vehicle.id, plate = %vehicle.plate_number, "Vehicle registered");
        Ok(vehicle)
    }

    /// Admin only
    pub async fn correct_type(
        &self,
        vehicle_id: Uuid,
        vehicle_type: VehicleType,
        actor_id: Uuid,
    ) -> LotResult<Vehicle> {
        let actor = resolve_actor(&self.repos, actor_id).await?;
        authorize(&actor, Capability::ManageLot)?;

        let mut vehicle = self.get_vehicle(vehicle_id).await?;
        if vehicle.vehicle_type != vehicle_type {
            info!(
                vehicle_id = %vehicle.id,
                from = %vehicle.vehicle_type,
                to = %vehicle_type,
                "Vehicle type corrected"
            );
            vehicle.vehicle_type = vehicle_type;
            self.repos.vehicles.save_vehicle(&vehicle).await?;
        }
        Ok(vehicle)
    }
}
