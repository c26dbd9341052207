pub mod models;

pub use models::enums::{ParseEnumError, Role, SpotStatus, TicketStatus, VehicleType};
pub use models::events::LotEvent;
pub use models::records::{ParkingSession, ParkingSpot, Ticket, User, Vehicle};
