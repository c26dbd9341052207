use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a value falls outside one of the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

// Shared plumbing for the closed sets: upper-case wire names, case-insensitive
// parsing, and deserialization that goes through `FromStr`.
macro_rules! closed_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: [$($wire),+].join(", "),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// Kind of vehicle. Also used as the spot type, which constrains who may park there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Truck,
    Bus,
    Van,
    Bicycle,
}

closed_enum!(VehicleType, "vehicle type", {
    Car => "CAR",
    Motorcycle => "MOTORCYCLE",
    Truck => "TRUCK",
    Bus => "BUS",
    Van => "VAN",
    Bicycle => "BICYCLE",
});

/// Occupancy of a parking spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum SpotStatus {
    Free,
    Reserved,
    Occupied,
}

closed_enum!(SpotStatus, "spot status", {
    Free => "FREE",
    Reserved => "RESERVED",
    Occupied => "OCCUPIED",
});

/// Ticket status in the lifecycle. Anything but `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
}

closed_enum!(TicketStatus, "ticket status", {
    Pending => "PENDING",
    Approved => "APPROVED",
    Rejected => "REJECTED",
});

impl TicketStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TicketStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    Attendant,
    Admin,
}

closed_enum!(Role, "role", {
    Attendant => "ATTENDANT",
    Admin => "ADMIN",
});
