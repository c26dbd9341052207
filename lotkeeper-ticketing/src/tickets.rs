use std::sync::Arc;

use chrono::Utc;
use lotkeeper_core::{
    authorize, Capability, EventPublisher, LotError, LotResult, Repositories, UnitOfWork,
};
use lotkeeper_shared::{LotEvent, SpotStatus, Ticket, TicketStatus, VehicleType};
use tracing::{info, warn};
use uuid::Uuid;

use crate::locks::LockTable;
use crate::sessions::SessionTracker;
use crate::spots::SpotRegistry;
use crate::users::resolve_actor;
use crate::vehicles::VehicleRegistry;

/// Manages ticket lifecycle: PENDING -> APPROVED | REJECTED.
///
/// The only writer of ticket status. Every transition holds the lock of the
/// ticket's spot and re-reads the ticket under it, so racing decisions on one
/// ticket resolve to a single winner.
#[derive(Clone)]
pub struct TicketManager {
    repos: Repositories,
    spots: SpotRegistry,
    vehicles: VehicleRegistry,
    sessions: SessionTracker,
    locks: Arc<LockTable>,
    events: Arc<dyn EventPublisher>,
}

impl TicketManager {
    pub fn new(
        repos: Repositories,
        spots: SpotRegistry,
        vehicles: VehicleRegistry,
        sessions: SessionTracker,
        locks: Arc<LockTable>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repos,
            spots,
            vehicles,
            sessions,
            locks,
            events,
        }
    }

    /// Request a spot for a known vehicle. On success the spot is RESERVED.
    pub async fn create_ticket(
        &self,
        vehicle_id: Uuid,
        spot_id: Uuid,
        requested_by_id: Uuid,
    ) -> LotResult<Ticket> {
        let requester = resolve_actor(&self.repos, requested_by_id).await?;
        let vehicle = self.vehicles.get_vehicle(vehicle_id).await?;

        let spot_guard = self.locks.lock_spot(spot_id).await;
        let _vehicle_guard = self.locks.lock_vehicle(vehicle.id).await;
        let spot = self.spots.get_spot(spot_id).await?;

        if !spot.accepts(vehicle.vehicle_type) {
            return Err(LotError::Validation(format!(
                "spot {} takes {} vehicles, got {}",
                spot.label, spot.spot_type, vehicle.vehicle_type
            )));
        }
        if let Some(pending) = self.repos.tickets.pending_for_spot(spot_id).await? {
            warn!(%spot_id, pending = %pending.id, "Spot already has a pending ticket");
            return Err(LotError::Conflict(format!(
                "spot {} already has pending ticket {}",
                spot.label, pending.id
            )));
        }
        if let Some(pending) = self.repos.tickets.pending_for_vehicle(vehicle.id).await? {
            warn!(vehicle_id = %vehicle.id, pending = %pending.id, "Vehicle already has a pending ticket");
            return Err(LotError::Conflict(format!(
                "vehicle {} already has pending ticket {}",
                vehicle.plate_number, pending.id
            )));
        }
        if let Some(open) = self.sessions.active_session_for_vehicle(vehicle.id).await? {
            return Err(LotError::Conflict(format!(
                "vehicle {} is already parked (session {})",
                vehicle.plate_number, open.id
            )));
        }
        let reserved = self.spots.stage_reserve(&spot_guard).await?;

        let ticket = Ticket::new(vehicle.id, spot.id, requester.id);
        self.repos
            .transactions
            .commit(UnitOfWork::new().spot(reserved).ticket(ticket.clone()))
            .await?;

        info!(
            ticket_id = %ticket.id,
            spot = %spot.label,
            plate = %vehicle.plate_number,
            requested_by = %requester.id,
            "Ticket created"
        );
        self.events.publish(LotEvent::TicketCreated {
            ticket_id: ticket.id,
            spot_id: spot.id,
            vehicle_id: vehicle.id,
            timestamp: ticket.created_at.timestamp(),
        });

        Ok(ticket)
    }

    /// Booking by plate: registers the vehicle on first sight, then creates the ticket.
    pub async fn request_ticket(
        &self,
        plate_number: &str,
        vehicle_type: VehicleType,
        spot_id: Uuid,
        requested_by_id: Uuid,
    ) -> LotResult<Ticket> {
        resolve_actor(&self.repos, requested_by_id).await?;
        self.spots.get_spot(spot_id).await?;

        let vehicle = self.vehicles.ensure_vehicle(plate_number, vehicle_type).await?;
        self.create_ticket(vehicle.id, spot_id, requested_by_id).await
    }

    /// PENDING -> APPROVED. Occupies the spot and opens a session checked in now.
    pub async fn approve(&self, ticket_id: Uuid, approved_by_id: Uuid) -> LotResult<Ticket> {
        let approver = resolve_actor(&self.repos, approved_by_id).await?;
        let peek = self.get_ticket(ticket_id).await?;
        authorize(&approver, Capability::ReviewTickets)?;

        let spot_guard = self.locks.lock_spot(peek.spot_id).await;
        let vehicle_guard = self.locks.lock_vehicle(peek.vehicle_id).await;

        let mut ticket = self.get_ticket(ticket_id).await?;
        if ticket.status != TicketStatus::Pending {
            warn!(%ticket_id, status = %ticket.status, "Approve on decided ticket");
            return Err(LotError::invalid_state("Ticket", ticket.status, TicketStatus::Approved));
        }
        self.sessions
            .check_can_open(&spot_guard, &vehicle_guard, SpotStatus::Reserved)
            .await?;

        let now = Utc::now();
        let occupied = self.spots.stage_occupy(&spot_guard).await?;
        let session = self
            .sessions
            .new_session(&spot_guard, &vehicle_guard, Some(ticket.id), now);
        ticket.decide(TicketStatus::Approved, approver.id, now);

        self.repos
            .transactions
            .commit(
                UnitOfWork::new()
                    .spot(occupied)
                    .session(session.clone())
                    .ticket(ticket.clone()),
            )
            .await?;

        info!(%ticket_id, approved_by = %approver.id, session_id = %session.id, "Ticket approved");
        self.events.publish(LotEvent::TicketApproved {
            ticket_id,
            spot_id: ticket.spot_id,
            approved_by_id: approver.id,
            session_id: session.id,
            timestamp: now.timestamp(),
        });

        Ok(ticket)
    }

    /// PENDING -> REJECTED. Frees the spot.
    pub async fn reject(&self, ticket_id: Uuid, approved_by_id: Uuid) -> LotResult<Ticket> {
        let reviewer = resolve_actor(&self.repos, approved_by_id).await?;
        let peek = self.get_ticket(ticket_id).await?;
        authorize(&reviewer, Capability::ReviewTickets)?;

        let spot_guard = self.locks.lock_spot(peek.spot_id).await;

        let mut ticket = self.get_ticket(ticket_id).await?;
        if ticket.status != TicketStatus::Pending {
            warn!(%ticket_id, status = %ticket.status, "Reject on decided ticket");
            return Err(LotError::invalid_state("Ticket", ticket.status, TicketStatus::Rejected));
        }
        let now = Utc::now();
        let freed = self.spots.stage_release(&spot_guard).await?;
        ticket.decide(TicketStatus::Rejected, reviewer.id, now);

        self.repos
            .transactions
            .commit(UnitOfWork::new().spot(freed).ticket(ticket.clone()))
            .await?;

        info!(%ticket_id, rejected_by = %reviewer.id, "Ticket rejected");
        self.events.publish(LotEvent::TicketRejected {
            ticket_id,
            spot_id: ticket.spot_id,
            rejected_by_id: reviewer.id,
            timestamp: now.timestamp(),
        });

        Ok(ticket)
    }

    pub async fn get_ticket(&self, id: Uuid) -> LotResult<Ticket> {
        self.repos
            .tickets
            .get_ticket(id)
            .await?
            .ok_or_else(|| LotError::not_found("Ticket", id))
    }

    /// Ticket with vehicle, spot and users embedded
    pub async fn get_ticket_expanded(&self, id: Uuid) -> LotResult<Ticket> {
        let ticket = self.get_ticket(id).await?;
        self.expand(ticket).await
    }

    /// Newest first, optionally by status
    pub async fn list_tickets(&self, status: Option<TicketStatus>, expand: bool) -> LotResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .repos
            .tickets
            .list_tickets()
            .await?
            .into_iter()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if !expand {
            return Ok(tickets);
        }

        let mut expanded = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            expanded.push(self.expand(ticket).await?);
        }
        Ok(expanded)
    }

    async fn expand(&self, mut ticket: Ticket) -> LotResult<Ticket> {
        ticket.vehicle = self.repos.vehicles.get_vehicle(ticket.vehicle_id).await?;
        ticket.spot = self.repos.spots.get_spot(ticket.spot_id).await?;
        ticket.requested_by = self.repos.users.get_user(ticket.requested_by_id).await?;
        ticket.approved_by = match ticket.approved_by_id {
            Some(id) => self.repos.users.get_user(id).await?,
            None => None,
        };
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{admin, attendant, fixture, Fixture};
    use futures_util::future::join_all;
    use lotkeeper_shared::Role;
    use lotkeeper_store::LotData;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn spot_status(fx: &Fixture, spot_id: Uuid) -> SpotStatus {
        fx.lot.spots.get_spot(spot_id).await.unwrap().status
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let fx = fixture().await;
        let lot = &fx.lot;

        let ticket = lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Reserved);

        let approved = lot.tickets.approve(ticket.id, admin(&fx).id).await.unwrap();
        assert_eq!(approved.status, TicketStatus::Approved);
        assert_eq!(approved.approved_by_id, Some(admin(&fx).id));
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Occupied);

        let open = lot.sessions.list_sessions(true).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].ticket_id, Some(ticket.id));
        assert_eq!(Some(open[0].check_in_at), approved.decided_at);

        let closed = lot
            .sessions
            .close_session(open[0].id, open[0].check_in_at + chrono::Duration::hours(3))
            .await
            .unwrap();
        assert!(closed.duration_seconds.unwrap() >= 0);
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Free);
    }

    #[tokio::test]
    async fn test_reject_frees_spot_without_session() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();

        let rejected = fx.lot.tickets.reject(ticket.id, attendant(&fx).id).await.unwrap();
        assert_eq!(rejected.status, TicketStatus::Rejected);
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Free);
        assert!(fx.lot.sessions.list_sessions(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decided_ticket_is_terminal() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        fx.lot.tickets.reject(ticket.id, attendant(&fx).id).await.unwrap();

        let err = fx.lot.tickets.approve(ticket.id, admin(&fx).id).await.unwrap_err();
        assert!(matches!(err, LotError::InvalidState { .. }));
        let err = fx.lot.tickets.reject(ticket.id, admin(&fx).id).await.unwrap_err();
        assert!(matches!(err, LotError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_create_on_busy_spot_has_no_side_effects() {
        let fx = fixture().await;
        let first = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();

        let other = fx.lot.vehicles.ensure_vehicle("CD-456", VehicleType::Car).await.unwrap();
        let err = fx
            .lot
            .tickets
            .create_ticket(other.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::Conflict(_)));

        let tickets = fx.lot.tickets.list_tickets(None, false).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, first.id);
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Reserved);

        // Still busy once occupied
        fx.lot.tickets.approve(first.id, admin(&fx).id).await.unwrap();
        let err = fx
            .lot
            .tickets
            .create_ticket(other.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_spot_type_must_match_vehicle() {
        let fx = fixture().await;
        let err = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.moto_spot.id, attendant(&fx).id)
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::Validation(_)));
        assert_eq!(spot_status(&fx, fx.moto_spot.id).await, SpotStatus::Free);
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let fx = fixture().await;
        let tickets = &fx.lot.tickets;

        let err = tickets
            .create_ticket(Uuid::new_v4(), fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::NotFound { entity: "Vehicle", .. }));

        let err = tickets
            .create_ticket(fx.car.id, Uuid::new_v4(), attendant(&fx).id)
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::NotFound { entity: "Spot", .. }));

        let err = tickets.approve(Uuid::new_v4(), admin(&fx).id).await.unwrap_err();
        assert!(matches!(err, LotError::NotFound { entity: "Ticket", .. }));
    }

    #[tokio::test]
    async fn test_approver_needs_review_capability() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();

        let err = fx.lot.tickets.approve(ticket.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LotError::NotFound { entity: "User", .. }));
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Reserved);

        // Both staff roles may review
        assert!(Capability::ReviewTickets.permits(Role::Attendant));
        assert!(Capability::ReviewTickets.permits(Role::Admin));
    }

    #[tokio::test]
    async fn test_parked_vehicle_cannot_book_again() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        fx.lot.tickets.approve(ticket.id, admin(&fx).id).await.unwrap();

        let spare = fx
            .lot
            .spots
            .register_spot(
                admin(&fx).id,
                crate::spots::NewSpot {
                    section: "B".into(),
                    number: 1,
                    spot_type: VehicleType::Car,
                    label: None,
                },
            )
            .await
            .unwrap();
        let err = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, spare.id, attendant(&fx).id)
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_request_ticket_registers_unseen_plate() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .request_ticket("mc 77", VehicleType::Motorcycle, fx.moto_spot.id, attendant(&fx).id)
            .await
            .unwrap();

        let vehicle = fx.lot.vehicles.find_by_plate("MC 77").await.unwrap().unwrap();
        assert_eq!(ticket.vehicle_id, vehicle.id);
        assert_eq!(vehicle.vehicle_type, VehicleType::Motorcycle);
    }

    #[tokio::test]
    async fn test_expanded_ticket_embeds_records() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        fx.lot.tickets.approve(ticket.id, admin(&fx).id).await.unwrap();

        let expanded = fx.lot.tickets.get_ticket_expanded(ticket.id).await.unwrap();
        assert_eq!(expanded.vehicle.unwrap().id, fx.car.id);
        assert_eq!(expanded.spot.unwrap().status, SpotStatus::Occupied);
        assert_eq!(expanded.requested_by.unwrap().id, attendant(&fx).id);
        assert_eq!(expanded.approved_by.unwrap().id, admin(&fx).id);

        let plain = fx.lot.tickets.get_ticket(ticket.id).await.unwrap();
        assert!(plain.vehicle.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let fx = fixture().await;
        let first = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        fx.lot.tickets.reject(first.id, admin(&fx).id).await.unwrap();
        fx.lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();

        let pending = fx.lot.tickets.list_tickets(Some(TicketStatus::Pending), false).await.unwrap();
        assert_eq!(pending.len(), 1);
        let rejected = fx.lot.tickets.list_tickets(Some(TicketStatus::Rejected), true).await.unwrap();
        assert_eq!(rejected.len(), 1);
        assert!(rejected[0].approved_by.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_single_winner() {
        let fx = fixture().await;
        let mut vehicles = Vec::new();
        for i in 0..6 {
            vehicles.push(
                fx.lot
                    .vehicles
                    .ensure_vehicle(&format!("RACE-{}", i), VehicleType::Car)
                    .await
                    .unwrap(),
            );
        }

        let requester = attendant(&fx).id;
        let results = join_all(vehicles.iter().map(|v| {
            let tickets = fx.lot.tickets.clone();
            let (vehicle_id, spot_id) = (v.id, fx.car_spot.id);
            tokio::spawn(async move { tickets.create_ticket(vehicle_id, spot_id, requester).await })
        }))
        .await;

        let (ok, err): (Vec<_>, Vec<_>) = results.into_iter().map(|r| r.unwrap()).partition(|r| r.is_ok());
        assert_eq!(ok.len(), 1);
        assert!(err.into_iter().all(|r| matches!(r, Err(LotError::Conflict(_)))));

        let pending = fx.lot.tickets.list_tickets(Some(TicketStatus::Pending), false).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_approve_single_winner() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();

        let reviewers = [admin(&fx).id, attendant(&fx).id, admin(&fx).id, attendant(&fx).id];
        let results = join_all(reviewers.iter().map(|&reviewer| {
            let tickets = fx.lot.tickets.clone();
            tokio::spawn(async move { tickets.approve(ticket.id, reviewer).await })
        }))
        .await;

        let (ok, err): (Vec<_>, Vec<_>) = results.into_iter().map(|r| r.unwrap()).partition(|r| r.is_ok());
        assert_eq!(ok.len(), 1);
        assert!(err.into_iter().all(|r| matches!(r, Err(LotError::InvalidState { .. }))));

        assert_eq!(fx.lot.sessions.list_sessions(true).await.unwrap().len(), 1);
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Occupied);
    }

    #[tokio::test]
    async fn test_vehicle_holds_one_pending_ticket() {
        let fx = fixture().await;
        let spare = fx
            .lot
            .spots
            .register_spot(
                admin(&fx).id,
                crate::spots::NewSpot {
                    section: "B".into(),
                    number: 1,
                    spot_type: VehicleType::Car,
                    label: None,
                },
            )
            .await
            .unwrap();

        let first = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        let err = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, spare.id, attendant(&fx).id)
            .await
            .unwrap_err();
        assert!(matches!(err, LotError::Conflict(_)));
        assert_eq!(spot_status(&fx, spare.id).await, SpotStatus::Free);

        // Once the first is decided the vehicle may book again
        fx.lot.tickets.reject(first.id, admin(&fx).id).await.unwrap();
        fx.lot
            .tickets
            .create_ticket(fx.car.id, spare.id, attendant(&fx).id)
            .await
            .unwrap();
        assert_eq!(spot_status(&fx, spare.id).await, SpotStatus::Reserved);
    }

    #[tokio::test]
    async fn test_approve_rechecks_vehicle_type() {
        let fx = fixture().await;
        let ticket = fx
            .lot
            .tickets
            .create_ticket(fx.car.id, fx.car_spot.id, attendant(&fx).id)
            .await
            .unwrap();
        fx.lot
            .vehicles
            .correct_type(fx.car.id, VehicleType::Van, admin(&fx).id)
            .await
            .unwrap();

        let err = fx.lot.tickets.approve(ticket.id, admin(&fx).id).await.unwrap_err();
        assert!(matches!(err, LotError::Validation(_)));
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Reserved);
        assert!(fx.lot.sessions.list_sessions(false).await.unwrap().is_empty());

        // Still pending, so it can be rejected to free the spot
        fx.lot.tickets.reject(ticket.id, admin(&fx).id).await.unwrap();
        assert_eq!(spot_status(&fx, fx.car_spot.id).await, SpotStatus::Free);
    }

    /// Every spot's status agrees with its pending tickets and open sessions.
    fn is_consistent(data: &LotData) -> bool {
        data.spots.values().all(|spot| {
            let pending = data
                .tickets
                .values()
                .filter(|t| t.spot_id == spot.id && t.status == TicketStatus::Pending)
                .count();
            let open = data
                .sessions
                .values()
                .filter(|s| s.spot_id == Some(spot.id) && s.is_open())
                .count();
            match spot.status {
                SpotStatus::Free => pending == 0 && open == 0,
                SpotStatus::Reserved => pending == 1 && open == 0,
                SpotStatus::Occupied => pending == 0 && open == 1,
            }
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_transitions() {
        let fx = fixture().await;
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let store = fx.store.clone();
            let lot = fx.lot.clone();
            let done = done.clone();
            tokio::spawn(async move {
                let (mut reads, mut broken) = (0usize, 0usize);
                loop {
                    let finished = done.load(Ordering::Relaxed);
                    if !is_consistent(&store.export().await) {
                        broken += 1;
                    }
                    let summary = lot.summary().await.unwrap();
                    if summary.reserved != summary.pending_tickets
                        || summary.occupied != summary.open_sessions
                    {
                        broken += 1;
                    }
                    reads += 1;
                    if finished {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
                (reads, broken)
            })
        };

        let requester = attendant(&fx).id;
        let reviewer = admin(&fx).id;
        for _ in 0..300 {
            let ticket = fx
                .lot
                .tickets
                .create_ticket(fx.car.id, fx.car_spot.id, requester)
                .await
                .unwrap();
            fx.lot.tickets.approve(ticket.id, reviewer).await.unwrap();
            let session = fx
                .lot
                .sessions
                .active_session_for_vehicle(fx.car.id)
                .await
                .unwrap()
                .unwrap();
            fx.lot
                .sessions
                .close_session(session.id, session.check_in_at + chrono::Duration::hours(1))
                .await
                .unwrap();
        }
        done.store(true, Ordering::Relaxed);

        let (reads, broken) = reader.await.unwrap();
        assert!(reads > 0);
        assert_eq!(broken, 0);
        assert!(is_consistent(&fx.store.export().await));
    }
}
