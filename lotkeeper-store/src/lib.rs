pub mod app_config;
pub mod events;
pub mod memory_repo;
pub mod seed;
pub mod snapshot;

pub use events::EventBus;
pub use memory_repo::{LotData, MemoryStore};
pub use seed::apply_seed;
