pub mod access;
pub mod error;
pub mod events;
pub mod rates;
pub mod repository;

pub use access::{authorize, Capability};
pub use error::{LotError, LotResult};
pub use events::{EventPublisher, NoopPublisher};
pub use rates::{FlatRate, RateConfig, RateFunction, TieredRate};
pub use repository::{
    LotView, Repositories, SessionRepository, SpotRepository, TicketRepository,
    TransactionRepository, UnitOfWork, UserRepository, VehicleRepository,
};
