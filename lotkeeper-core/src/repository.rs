use std::sync::Arc;

use async_trait::async_trait;
use lotkeeper_shared::{ParkingSession, ParkingSpot, Ticket, User, Vehicle};
use uuid::Uuid;

use crate::LotResult;

/// Repository trait for parking spot records
#[async_trait]
pub trait SpotRepository: Send + Sync {
    async fn get_spot(&self, id: Uuid) -> LotResult<Option<ParkingSpot>>;

    async fn list_spots(&self) -> LotResult<Vec<ParkingSpot>>;

    /// Insert or replace
    async fn save_spot(&self, spot: &ParkingSpot) -> LotResult<()>;
}

/// Repository trait for vehicle records
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn get_vehicle(&self, id: Uuid) -> LotResult<Option<Vehicle>>;

    /// Lookup by an already normalized plate
    async fn find_by_plate(&self, plate_number: &str) -> LotResult<Option<Vehicle>>;

    async fn list_vehicles(&self) -> LotResult<Vec<Vehicle>>;

    async fn save_vehicle(&self, vehicle: &Vehicle) -> LotResult<()>;
}

/// Repository trait for tickets
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn get_ticket(&self, id: Uuid) -> LotResult<Option<Ticket>>;

    async fn list_tickets(&self) -> LotResult<Vec<Ticket>>;

    /// The PENDING ticket holding a spot, if any
    async fn pending_for_spot(&self, spot_id: Uuid) -> LotResult<Option<Ticket>>;

    /// The PENDING ticket requested for a vehicle, if any
    async fn pending_for_vehicle(&self, vehicle_id: Uuid) -> LotResult<Option<Ticket>>;

    async fn save_ticket(&self, ticket: &Ticket) -> LotResult<()>;
}

/// Repository trait for parking sessions
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get_session(&self, id: Uuid) -> LotResult<Option<ParkingSession>>;

    async fn list_sessions(&self) -> LotResult<Vec<ParkingSession>>;

    async fn open_for_vehicle(&self, vehicle_id: Uuid) -> LotResult<Option<ParkingSession>>;

    async fn open_for_spot(&self, spot_id: Uuid) -> LotResult<Option<ParkingSession>>;

    async fn save_session(&self, session: &ParkingSession) -> LotResult<()>;
}

/// Repository trait for dashboard users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> LotResult<Option<User>>;

    /// Lookup by lower-cased email
    async fn find_by_email(&self, email: &str) -> LotResult<Option<User>>;

    async fn list_users(&self) -> LotResult<Vec<User>>;

    async fn save_user(&self, user: &User) -> LotResult<()>;
}

/// Records changed together by one lifecycle transition
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    pub spots: Vec<ParkingSpot>,
    pub tickets: Vec<Ticket>,
    pub sessions: Vec<ParkingSession>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spot(mut self, spot: ParkingSpot) -> Self {
        self.spots.push(spot);
        self
    }

    pub fn ticket(mut self, ticket: Ticket) -> Self {
        self.tickets.push(ticket);
        self
    }

    pub fn session(mut self, session: ParkingSession) -> Self {
        self.sessions.push(session);
        self
    }
}

/// Spots, tickets and sessions as of one instant
#[derive(Debug, Clone, Default)]
pub struct LotView {
    pub spots: Vec<ParkingSpot>,
    pub tickets: Vec<Ticket>,
    pub sessions: Vec<ParkingSession>,
}

/// Multi-record writes and reads that must not interleave with each other
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Store every record of `work`, or none of them
    async fn commit(&self, work: UnitOfWork) -> LotResult<()>;

    async fn view(&self) -> LotResult<LotView>;
}

/// Handles to every repository, shared by the ticketing services.
#[derive(Clone)]
pub struct Repositories {
    pub spots: Arc<dyn SpotRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
}
