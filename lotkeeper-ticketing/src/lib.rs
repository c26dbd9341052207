pub mod locks;
pub mod sessions;
pub mod spots;
pub mod summary;
pub mod tickets;
pub mod users;
pub mod vehicles;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use lotkeeper_core::{EventPublisher, LotResult, RateFunction, Repositories};

pub use locks::{LockTable, SpotGuard, VehicleGuard};
pub use sessions::SessionTracker;
pub use spots::{NewSpot, SpotFilter, SpotRegistry};
pub use summary::LotSummary;
pub use tickets::TicketManager;
pub use users::{NewUser, UserDirectory};
pub use vehicles::VehicleRegistry;

/// The lot's services wired over one set of repositories and one lock table.
#[derive(Clone)]
pub struct ParkingLot {
    pub spots: SpotRegistry,
    pub vehicles: VehicleRegistry,
    pub users: UserDirectory,
    pub sessions: SessionTracker,
    pub tickets: TicketManager,
    repos: Repositories,
}

impl ParkingLot {
    pub fn new(
        repos: Repositories,
        rate: Arc<dyn RateFunction>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let locks = Arc::new(LockTable::new());

        let spots = SpotRegistry::new(repos.clone(), locks.clone());
        let vehicles = VehicleRegistry::new(repos.clone());
        let users = UserDirectory::new(repos.clone());
        let sessions = SessionTracker::new(
            repos.clone(),
            spots.clone(),
            locks.clone(),
            rate,
            events.clone(),
        );
        let tickets = TicketManager::new(
            repos.clone(),
            spots.clone(),
            vehicles.clone(),
            sessions.clone(),
            locks,
            events,
        );

        Self {
            spots,
            vehicles,
            users,
            sessions,
            tickets,
            repos,
        }
    }

    pub async fn summary(&self) -> LotResult<LotSummary> {
        summary::summarize(&self.repos).await
    }
}
