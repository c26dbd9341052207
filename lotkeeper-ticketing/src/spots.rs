use std::sync::Arc;

use lotkeeper_core::{authorize, Capability, LotError, LotResult, Repositories};
use lotkeeper_shared::{ParkingSpot, SpotStatus, VehicleType};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::locks::{LockTable, SpotGuard};
use crate::users::resolve_actor;

#[derive(Debug, Clone, Default)]
pub struct SpotFilter {
    pub status: Option<SpotStatus>,
    pub section: Option<String>,
    pub spot_type: Option<VehicleType>,
}

impl SpotFilter {
    fn matches(&self, spot: &ParkingSpot) -> bool {
        self.status.map_or(true, |s| spot.status == s)
            && self
                .section
                .as_deref()
                .map_or(true, |s| spot.section.eq_ignore_ascii_case(s.trim()))
            && self.spot_type.map_or(true, |t| spot.spot_type == t)
    }
}

#[derive(Debug, Clone)]
pub struct NewSpot {
    pub section: String,
    pub number: u32,
    pub spot_type: VehicleType,
    pub label: Option<String>,
}

/// Owner of spot status. Status changes require the spot's `SpotGuard`.
#[derive(Clone)]
pub struct SpotRegistry {
    repos: Repositories,
    locks: Arc<LockTable>,
    registration: Arc<Mutex<()>>,
}

impl SpotRegistry {
    pub fn new(repos: Repositories, locks: Arc<LockTable>) -> Self {
        Self {
            repos,
            locks,
            registration: Arc::new(Mutex::new(())),
        }
    }

    pub async fn lock(&self, spot_id: Uuid) -> SpotGuard {
        self.locks.lock_spot(spot_id).await
    }

    pub async fn get_spot(&self, id: Uuid) -> LotResult<ParkingSpot> {
        self.repos
            .spots
            .get_spot(id)
            .await?
            .ok_or_else(|| LotError::not_found("Spot", id))
    }

    /// Sorted by section, then number
    pub async fn list_spots(&self, filter: &SpotFilter) -> LotResult<Vec<ParkingSpot>> {
        let mut spots: Vec<ParkingSpot> = self
            .repos
            .spots
            .list_spots()
            .await?
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect();
        spots.sort_by(|a, b| a.section.cmp(&b.section).then(a.number.cmp(&b.number)));
        Ok(spots)
    }

    /// Admin only. New spots start FREE.
    pub async fn register_spot(&self, actor_id: Uuid, new: NewSpot) -> LotResult<ParkingSpot> {
        let actor = resolve_actor(&self.repos, actor_id).await?;
        authorize(&actor, Capability::ManageLot)?;

        if new.section.trim().is_empty() {
            return Err(LotError::Validation("section must not be empty".into()));
        }
        if new.number == 0 {
            return Err(LotError::Validation("spot number must be positive".into()));
        }

        let spot = ParkingSpot::new(&new.section, new.number, new.spot_type, new.label);

        let _registering = self.registration.lock().await;
        let duplicate = self
            .repos
            .spots
            .list_spots()
            .await?
            .into_iter()
            .any(|s| s.section == spot.section && s.number == spot.number);
        if duplicate {
            return Err(LotError::Conflict(format!(
                "spot {}-{} already exists",
                spot.section, spot.number
            )));
        }

        self.repos.spots.save_spot(&spot).await?;
        info!(spot_id = %spot.id, label = %spot.label, "Spot registered");
        Ok(spot)
    }

    /// FREE -> RESERVED
    pub async fn reserve(&self, guard: &SpotGuard) -> LotResult<ParkingSpot> {
        let spot = self.stage_reserve(guard).await?;
        self.repos.spots.save_spot(&spot).await?;
        Ok(spot)
    }

    /// RESERVED -> OCCUPIED
    pub async fn occupy(&self, guard: &SpotGuard) -> LotResult<ParkingSpot> {
        let spot = self.stage_occupy(guard).await?;
        self.repos.spots.save_spot(&spot).await?;
        Ok(spot)
    }

    /// Any -> FREE. Releasing a FREE spot is a no-op.
    pub async fn release(&self, guard: &SpotGuard) -> LotResult<ParkingSpot> {
        let spot = self.stage_release(guard).await?;
        self.repos.spots.save_spot(&spot).await?;
        Ok(spot)
    }

    // The stage_* variants check the transition and return the updated spot
    // unsaved, for callers that commit it together with other records.

    pub(crate) async fn stage_reserve(&self, guard: &SpotGuard) -> LotResult<ParkingSpot> {
        self.transition(guard, SpotStatus::Free, SpotStatus::Reserved).await
    }

    pub(crate) async fn stage_occupy(&self, guard: &SpotGuard) -> LotResult<ParkingSpot> {
        self.transition(guard, SpotStatus::Reserved, SpotStatus::Occupied).await
    }

    pub(crate) async fn stage_release(&self, guard: &SpotGuard) -> LotResult<ParkingSpot> {
        let mut spot = self.get_spot(guard.spot_id()).await?;
        spot.status = SpotStatus::Free;
        Ok(spot)
    }

    async fn transition(
        &self,
        guard: &SpotGuard,
        from: SpotStatus,
        to: SpotStatus,
    ) -> LotResult<ParkingSpot> {
        let mut spot = self.get_spot(guard.spot_id()).await?;

        if spot.status != from {
            warn!(spot_id = %spot.id, status = %spot.status, target = %to, "Spot unavailable");
            return Err(LotError::Conflict(format!(
                "spot {} is {}, expected {}",
                spot.label, spot.status, from
            )));
        }

        spot.status = to;
        Ok(spot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{admin, attendant, fixture};

    #[tokio::test]
    async fn test_reserve_occupy_release() {
        let fx = fixture().await;
        let registry = &fx.lot.spots;
        let spot_id = fx.car_spot.id;

        let guard = registry.lock(spot_id).await;
        assert_eq!(registry.reserve(&guard).await.unwrap().status, SpotStatus::Reserved);
        assert_eq!(registry.occupy(&guard).await.unwrap().status, SpotStatus::Occupied);
        assert_eq!(registry.release(&guard).await.unwrap().status, SpotStatus::Free);

        // Idempotent
        assert_eq!(registry.release(&guard).await.unwrap().status, SpotStatus::Free);
    }

    #[tokio::test]
    async fn test_illegal_transitions_conflict() {
        let fx = fixture().await;
        let registry = &fx.lot.spots;
        let guard = registry.lock(fx.car_spot.id).await;

        assert!(matches!(registry.occupy(&guard).await, Err(LotError::Conflict(_))));

        registry.reserve(&guard).await.unwrap();
        assert!(matches!(registry.reserve(&guard).await, Err(LotError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_spot() {
        let fx = fixture().await;
        let err = fx.lot.spots.get_spot(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LotError::NotFound { entity: "Spot", .. }));
    }

    #[tokio::test]
    async fn test_register_requires_admin_and_unique_position() {
        let fx = fixture().await;
        let new = NewSpot {
            section: "c".into(),
            number: 7,
            spot_type: VehicleType::Bus,
            label: None,
        };

        let err = fx
            .lot
            .spots
            .register_spot(attendant(&fx).id, new.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::Authorization(_)));

        let spot = fx.lot.spots.register_spot(admin(&fx).id, new.clone()).await.unwrap();
        assert_eq!(spot.label, "C-7");
        assert_eq!(spot.status, SpotStatus::Free);

        let err = fx.lot.spots.register_spot(admin(&fx).id, new).await.unwrap_err();
        assert!(matches!(err, LotError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let fx = fixture().await;

        let all = fx.lot.spots.list_spots(&SpotFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.windows(2).all(|w| (&w[0].section, w[0].number) <= (&w[1].section, w[1].number)));

        let bikes = fx
            .lot
            .spots
            .list_spots(&SpotFilter {
                spot_type: Some(VehicleType::Motorcycle),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(bikes.len(), 1);
        assert_eq!(bikes[0].id, fx.moto_spot.id);
    }
}
