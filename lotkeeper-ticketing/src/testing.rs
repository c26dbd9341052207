use std::sync::Arc;

use lotkeeper_core::{NoopPublisher, TieredRate};
use lotkeeper_shared::{ParkingSpot, Role, User, Vehicle, VehicleType};
use lotkeeper_store::MemoryStore;

use crate::ParkingLot;

pub(crate) struct Fixture {
    pub lot: ParkingLot,
    pub store: Arc<MemoryStore>,
    pub users: Vec<User>,
    pub car_spot: ParkingSpot,
    pub moto_spot: ParkingSpot,
    pub car: Vehicle,
}

pub(crate) fn admin(fx: &Fixture) -> &User {
    &fx.users[0]
}

pub(crate) fn attendant(fx: &Fixture) -> &User {
    &fx.users[1]
}

/// Lot with an admin, an attendant, a CAR spot A-1, a MOTORCYCLE spot A-2 and car AB-123.
pub(crate) async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let repos = store.repositories();

    let users = vec![
        User::new("Bo", "Lind", "bo@lot.test", Role::Admin),
        User::new("Ana", "Ruiz", "ana@lot.test", Role::Attendant),
    ];
    for user in &users {
        repos.users.save_user(user).await.unwrap();
    }

    let car_spot = ParkingSpot::new("A", 1, VehicleType::Car, None);
    let moto_spot = ParkingSpot::new("A", 2, VehicleType::Motorcycle, None);
    repos.spots.save_spot(&car_spot).await.unwrap();
    repos.spots.save_spot(&moto_spot).await.unwrap();

    let car = Vehicle::new("AB-123", VehicleType::Car);
    repos.vehicles.save_vehicle(&car).await.unwrap();

    let lot = ParkingLot::new(repos, Arc::new(TieredRate::default()), Arc::new(NoopPublisher));

    Fixture {
        lot,
        store,
        users,
        car_spot,
        moto_spot,
        car,
    }
}
