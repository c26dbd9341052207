use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lotkeeper_core::{
    LotResult, LotView, Repositories, SessionRepository, SpotRepository, TicketRepository,
    TransactionRepository, UnitOfWork, UserRepository, VehicleRepository,
};
use lotkeeper_shared::{ParkingSession, ParkingSpot, Ticket, TicketStatus, User, Vehicle};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Every record the lot keeps. Also the on-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LotData {
    pub spots: HashMap<Uuid, ParkingSpot>,
    pub vehicles: HashMap<Uuid, Vehicle>,
    pub tickets: HashMap<Uuid, Ticket>,
    pub sessions: HashMap<Uuid, ParkingSession>,
    pub users: HashMap<Uuid, User>,
}

/// In-memory backing for all repositories.
///
/// Reads clone out of a single `RwLock`, so every list is a consistent
/// snapshot. A `UnitOfWork` is applied under one write guard, so readers
/// never see half of a transition. Write serialization per spot is the
/// ticketing layer's job.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<LotData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trait-object handles for the ticketing services
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            spots: self.clone(),
            vehicles: self.clone(),
            tickets: self.clone(),
            sessions: self.clone(),
            users: self.clone(),
            transactions: self.clone(),
        }
    }

    pub async fn export(&self) -> LotData {
        self.data.read().await.clone()
    }

    pub async fn import(&self, data: LotData) {
        *self.data.write().await = data;
    }
}

#[async_trait]
impl SpotRepository for MemoryStore {
    async fn get_spot(&self, id: Uuid) -> LotResult<Option<ParkingSpot>> {
        Ok(self.data.read().await.spots.get(&id).cloned())
    }

    async fn list_spots(&self) -> LotResult<Vec<ParkingSpot>> {
        Ok(self.data.read().await.spots.values().cloned().collect())
    }

    async fn save_spot(&self, spot: &ParkingSpot) -> LotResult<()> {
        self.data.write().await.spots.insert(spot.id, spot.clone());
        Ok(())
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn get_vehicle(&self, id: Uuid) -> LotResult<Option<Vehicle>> {
        Ok(self.data.read().await.vehicles.get(&id).cloned())
    }

    async fn find_by_plate(&self, plate_number: &str) -> LotResult<Option<Vehicle>> {
        Ok(self
            .data
            .read()
            .await
            .vehicles
            .values()
            .find(|v| v.plate_number == plate_number)
            .cloned())
    }

    async fn list_vehicles(&self) -> LotResult<Vec<Vehicle>> {
        Ok(self.data.read().await.vehicles.values().cloned().collect())
    }

    async fn save_vehicle(&self, vehicle: &Vehicle) -> LotResult<()> {
        self.data.write().await.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(())
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn get_ticket(&self, id: Uuid) -> LotResult<Option<Ticket>> {
        Ok(self.data.read().await.tickets.get(&id).cloned())
    }

    async fn list_tickets(&self) -> LotResult<Vec<Ticket>> {
        Ok(self.data.read().await.tickets.values().cloned().collect())
    }

    async fn pending_for_spot(&self, spot_id: Uuid) -> LotResult<Option<Ticket>> {
        Ok(self
            .data
            .read()
            .await
            .tickets
            .values()
            .find(|t| t.spot_id == spot_id && t.status == TicketStatus::Pending)
            .cloned())
    }

    async fn pending_for_vehicle(&self, vehicle_id: Uuid) -> LotResult<Option<Ticket>> {
        Ok(self
            .data
            .read()
            .await
            .tickets
            .values()
            .find(|t| t.vehicle_id == vehicle_id && t.status == TicketStatus::Pending)
            .cloned())
    }

    async fn save_ticket(&self, ticket: &Ticket) -> LotResult<()> {
        // Embedded records are a read-side projection and never stored.
        self.data
            .write()
            .await
            .tickets
            .insert(ticket.id, ticket.stripped());
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn get_session(&self, id: Uuid) -> LotResult<Option<ParkingSession>> {
        Ok(self.data.read().await.sessions.get(&id).cloned())
    }

    async fn list_sessions(&self) -> LotResult<Vec<ParkingSession>> {
        Ok(self.data.read().await.sessions.values().cloned().collect())
    }

    async fn open_for_vehicle(&self, vehicle_id: Uuid) -> LotResult<Option<ParkingSession>> {
        Ok(self
            .data
            .read()
            .await
            .sessions
            .values()
            .find(|s| s.vehicle_id == vehicle_id && s.is_open())
            .cloned())
    }

    async fn open_for_spot(&self, spot_id: Uuid) -> LotResult<Option<ParkingSession>> {
        Ok(self
            .data
            .read()
            .await
            .sessions
            .values()
            .find(|s| s.spot_id == Some(spot_id) && s.is_open())
            .cloned())
    }

    async fn save_session(&self, session: &ParkingSession) -> LotResult<()> {
        self.data.write().await.sessions.insert(session.id, session.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, id: Uuid) -> LotResult<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> LotResult<Option<User>> {
        Ok(self
            .data
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> LotResult<Vec<User>> {
        Ok(self.data.read().await.users.values().cloned().collect())
    }

    async fn save_user(&self, user: &User) -> LotResult<()> {
        self.data.write().await.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn commit(&self, work: UnitOfWork) -> LotResult<()> {
        let mut data = self.data.write().await;
        for spot in work.spots {
            data.spots.insert(spot.id, spot);
        }
        for ticket in work.tickets {
            data.tickets.insert(ticket.id, ticket.stripped());
        }
        for session in work.sessions {
            data.sessions.insert(session.id, session);
        }
        Ok(())
    }

    async fn view(&self) -> LotResult<LotView> {
        let data = self.data.read().await;
        Ok(LotView {
            spots: data.spots.values().cloned().collect(),
            tickets: data.tickets.values().cloned().collect(),
            sessions: data.sessions.values().cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotkeeper_shared::{ParkingSpot, Role, SpotStatus, VehicleType};

    #[tokio::test]
    async fn test_pending_lookup_ignores_decided_tickets() {
        let store = Arc::new(MemoryStore::new());
        let spot_id = Uuid::new_v4();

        let mut decided = Ticket::new(Uuid::new_v4(), spot_id, Uuid::new_v4());
        decided.decide(TicketStatus::Rejected, Uuid::new_v4(), chrono::Utc::now());
        store.save_ticket(&decided).await.unwrap();
        assert!(store.pending_for_spot(spot_id).await.unwrap().is_none());

        let pending = Ticket::new(Uuid::new_v4(), spot_id, Uuid::new_v4());
        store.save_ticket(&pending).await.unwrap();
        assert_eq!(store.pending_for_spot(spot_id).await.unwrap().unwrap().id, pending.id);
    }

    #[tokio::test]
    async fn test_saved_ticket_drops_embedded_records() {
        let store = MemoryStore::new();
        let mut ticket = Ticket::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        ticket.vehicle = Some(Vehicle::new("AB-1", VehicleType::Car));

        store.save_ticket(&ticket).await.unwrap();
        let stored = store.get_ticket(ticket.id).await.unwrap().unwrap();
        assert!(stored.vehicle.is_none());
    }

    #[tokio::test]
    async fn test_repositories_share_one_store() {
        let store = Arc::new(MemoryStore::new());
        let repos = store.repositories();

        let user = User::new("Ana", "Ruiz", "ana@lot.test", Role::Admin);
        repos.users.save_user(&user).await.unwrap();

        assert_eq!(store.export().await.users.len(), 1);
        assert!(repos.users.find_by_email("ana@lot.test").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_writes_every_record() {
        let store = MemoryStore::new();
        let mut spot = ParkingSpot::new("A", 1, VehicleType::Car, None);
        spot.status = SpotStatus::Reserved;
        let mut ticket = Ticket::new(Uuid::new_v4(), spot.id, Uuid::new_v4());
        ticket.vehicle = Some(Vehicle::new("AB-1", VehicleType::Car));

        store
            .commit(UnitOfWork::new().spot(spot.clone()).ticket(ticket.clone()))
            .await
            .unwrap();

        let view = store.view().await.unwrap();
        assert_eq!(view.spots, vec![spot]);
        assert_eq!(view.tickets.len(), 1);
        assert!(view.tickets[0].vehicle.is_none());
        assert_eq!(
            store.pending_for_vehicle(ticket.vehicle_id).await.unwrap().unwrap().id,
            ticket.id
        );
    }
}
