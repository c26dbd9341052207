use std::sync::Arc;

use chrono::{DateTime, Utc};
use lotkeeper_core::{
    EventPublisher, LotError, LotResult, RateFunction, Repositories, UnitOfWork,
};
use lotkeeper_shared::{LotEvent, ParkingSession, SpotStatus};
use tracing::{info, warn};
use uuid::Uuid;

use crate::locks::{LockTable, SpotGuard, VehicleGuard};
use crate::spots::SpotRegistry;

/// Check-in / check-out bookkeeping for occupied spots
#[derive(Clone)]
pub struct SessionTracker {
    repos: Repositories,
    spots: SpotRegistry,
    locks: Arc<LockTable>,
    rate: Arc<dyn RateFunction>,
    events: Arc<dyn EventPublisher>,
}

impl SessionTracker {
    pub fn new(
        repos: Repositories,
        spots: SpotRegistry,
        locks: Arc<LockTable>,
        rate: Arc<dyn RateFunction>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repos,
            spots,
            locks,
            rate,
            events,
        }
    }

    pub async fn get_session(&self, id: Uuid) -> LotResult<ParkingSession> {
        self.repos
            .sessions
            .get_session(id)
            .await?
            .ok_or_else(|| LotError::not_found("Session", id))
    }

    /// Newest check-in first
    pub async fn list_sessions(&self, open_only: bool) -> LotResult<Vec<ParkingSession>> {
        let mut sessions: Vec<ParkingSession> = self
            .repos
            .sessions
            .list_sessions()
            .await?
            .into_iter()
            .filter(|s| !open_only || s.is_open())
            .collect();
        sessions.sort_by(|a, b| b.check_in_at.cmp(&a.check_in_at));
        Ok(sessions)
    }

    pub async fn active_session_for_vehicle(&self, vehicle_id: Uuid) -> LotResult<Option<ParkingSession>> {
        self.repos.sessions.open_for_vehicle(vehicle_id).await
    }

    /// Open a session on an OCCUPIED spot that has none, checking in now.
    pub async fn open_session(&self, vehicle_id: Uuid, spot_id: Uuid) -> LotResult<ParkingSession> {
        let spot_guard = self.locks.lock_spot(spot_id).await;
        let vehicle_guard = self.locks.lock_vehicle(vehicle_id).await;

        self.check_can_open(&spot_guard, &vehicle_guard, SpotStatus::Occupied)
            .await?;

        let session = self.new_session(&spot_guard, &vehicle_guard, None, Utc::now());
        self.repos.sessions.save_session(&session).await?;
        info!(
            session_id = %session.id,
            %spot_id,
            %vehicle_id,
            "Walk-in session opened"
        );
        Ok(session)
    }

    /// Preconditions for a new session, without writing anything. The
    /// vehicle must exist and fit the spot, and the spot must currently be
    /// in `spot_status`.
    pub(crate) async fn check_can_open(
        &self,
        spot_guard: &SpotGuard,
        vehicle_guard: &VehicleGuard,
        spot_status: SpotStatus,
    ) -> LotResult<()> {
        let vehicle_id = vehicle_guard.vehicle_id();
        let vehicle = self
            .repos
            .vehicles
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| LotError::not_found("Vehicle", vehicle_id))?;
        let spot = self.spots.get_spot(spot_guard.spot_id()).await?;

        if !spot.accepts(vehicle.vehicle_type) {
            return Err(LotError::Validation(format!(
                "spot {} takes {} vehicles, {} is a {}",
                spot.label, spot.spot_type, vehicle.plate_number, vehicle.vehicle_type
            )));
        }
        if spot.status != spot_status {
            return Err(LotError::Conflict(format!(
                "spot {} is {}, no vehicle can be checked in",
                spot.label, spot.status
            )));
        }
        if let Some(open) = self.repos.sessions.open_for_spot(spot.id).await? {
            return Err(LotError::Conflict(format!(
                "spot {} already has open session {}",
                spot.label, open.id
            )));
        }
        if let Some(open) = self.repos.sessions.open_for_vehicle(vehicle_id).await? {
            return Err(LotError::Conflict(format!(
                "vehicle {} is already parked (session {})",
                vehicle.plate_number, open.id
            )));
        }
        Ok(())
    }

    /// Unsaved session for the locked spot and vehicle. Callers run
    /// `check_can_open` under the same guards first.
    pub(crate) fn new_session(
        &self,
        spot_guard: &SpotGuard,
        vehicle_guard: &VehicleGuard,
        ticket_id: Option<Uuid>,
        check_in_at: DateTime<Utc>,
    ) -> ParkingSession {
        ParkingSession::open(
            vehicle_guard.vehicle_id(),
            spot_guard.spot_id(),
            ticket_id,
            check_in_at,
        )
    }

    /// Check out: stamp the time, price the stay, free the spot.
    pub async fn close_session(
        &self,
        session_id: Uuid,
        checkout_at: DateTime<Utc>,
    ) -> LotResult<ParkingSession> {
        let peek = self.get_session(session_id).await?;
        let spot_id = peek
            .spot_id
            .ok_or_else(|| LotError::invalid_state("Session", "CLOSED", "CLOSED"))?;

        let spot_guard = self.locks.lock_spot(spot_id).await;
        let _vehicle_guard = self.locks.lock_vehicle(peek.vehicle_id).await;

        let mut session = self.get_session(session_id).await?;
        if !session.is_open() {
            warn!(%session_id, "Session already closed");
            return Err(LotError::invalid_state("Session", "CLOSED", "CLOSED"));
        }
        if checkout_at < session.check_in_at {
            return Err(LotError::Validation(format!(
                "checkout {} precedes check-in {}",
                checkout_at, session.check_in_at
            )));
        }

        let spot = self.spots.stage_release(&spot_guard).await?;
        let cost = self.rate.cost(checkout_at - session.check_in_at, spot.spot_type);
        session.close(checkout_at, cost);

        self.repos
            .transactions
            .commit(UnitOfWork::new().session(session.clone()).spot(spot.clone()))
            .await?;

        let duration_seconds = session.duration_seconds.unwrap_or_default();
        info!(
            %session_id,
            spot = %spot.label,
            duration_seconds,
            cost_cents = cost,
            "Session closed"
        );
        self.events.publish(LotEvent::SessionClosed {
            session_id,
            spot_id: session.spot_id,
            vehicle_id: session.vehicle_id,
            duration_seconds,
            cost_cents: cost,
            timestamp: checkout_at.timestamp(),
        });

        Ok(session)
    }
}
