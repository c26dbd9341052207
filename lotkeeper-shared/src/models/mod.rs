pub mod enums;
pub mod events;
pub mod records;
