use lotkeeper_store::EventBus;
use lotkeeper_ticketing::ParkingLot;

#[derive(Clone)]
pub struct AppState {
    pub lot: ParkingLot,
    pub events: EventBus,
}
