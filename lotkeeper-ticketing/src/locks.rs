use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Per-key async mutexes. Every write to a spot, and to the sessions of a
/// vehicle, happens while holding the matching guard.
///
/// Lock order is spot before vehicle.
#[derive(Default)]
pub struct LockTable {
    spots: DashMap<Uuid, Arc<Mutex<()>>>,
    vehicles: DashMap<Uuid, Arc<Mutex<()>>>,
}

/// Proof that the caller holds a spot's lock
pub struct SpotGuard {
    spot_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

impl SpotGuard {
    pub fn spot_id(&self) -> Uuid {
        self.spot_id
    }
}

/// Proof that the caller holds a vehicle's lock
pub struct VehicleGuard {
    vehicle_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

impl VehicleGuard {
    pub fn vehicle_id(&self) -> Uuid {
        self.vehicle_id
    }
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock_spot(&self, spot_id: Uuid) -> SpotGuard {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = self.spots.entry(spot_id).or_default().clone();
        let guard = lock.lock_owned().await;
        debug!(%spot_id, "Spot lock acquired");
        SpotGuard {
            spot_id,
            _guard: guard,
        }
    }

    pub async fn lock_vehicle(&self, vehicle_id: Uuid) -> VehicleGuard {
        let lock = self.vehicles.entry(vehicle_id).or_default().clone();
        let guard = lock.lock_owned().await;
        VehicleGuard {
            vehicle_id,
            _guard: guard,
        }
    }
}
