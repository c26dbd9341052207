use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Role, SpotStatus, TicketStatus, VehicleType};

/// Canonical form of a plate: trimmed, inner whitespace collapsed, upper case.
pub fn normalize_plate(plate: &str) -> String {
    plate
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(plate_number: &str, vehicle_type: VehicleType) -> Self {
        Self {
            id: Uuid::new_v4(),
            plate_number: normalize_plate(plate_number),
            vehicle_type,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSpot {
    pub id: Uuid,
    pub label: String,
    pub section: String,
    pub number: u32,
    pub status: SpotStatus,
    #[serde(rename = "type")]
    pub spot_type: VehicleType,
}

impl ParkingSpot {
    /// A new spot starts FREE. The label defaults to `{section}-{number}`.
    pub fn new(section: &str, number: u32, spot_type: VehicleType, label: Option<String>) -> Self {
        let section = section.trim().to_uppercase();
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("{}-{}", section, number));

        Self {
            id: Uuid::new_v4(),
            label,
            section,
            number,
            status: SpotStatus::Free,
            spot_type,
        }
    }

    pub fn accepts(&self, vehicle_type: VehicleType) -> bool {
        self.spot_type == vehicle_type
    }
}

/// A request to occupy a spot with a vehicle, subject to approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub status: TicketStatus,
    pub vehicle_id: Uuid,
    pub spot_id: Uuid,
    pub requested_by_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,

    // Populated only on expanded reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot: Option<ParkingSpot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<User>,
}

impl Ticket {
    pub fn new(vehicle_id: Uuid, spot_id: Uuid, requested_by_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: TicketStatus::Pending,
            vehicle_id,
            spot_id,
            requested_by_id,
            approved_by_id: None,
            created_at: Utc::now(),
            decided_at: None,
            vehicle: None,
            spot: None,
            requested_by: None,
            approved_by: None,
        }
    }

    /// Record the terminal decision. Callers check the transition is legal first.
    pub fn decide(&mut self, status: TicketStatus, decided_by: Uuid, at: DateTime<Utc>) {
        self.status = status;
        self.approved_by_id = Some(decided_by);
        self.decided_at = Some(at);
    }

    /// Copy without the embedded records, as stored.
    pub fn stripped(&self) -> Self {
        Self {
            vehicle: None,
            spot: None,
            requested_by: None,
            approved_by: None,
            ..self.clone()
        }
    }
}

/// Time a vehicle spends on a spot, from check-in to check-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSession {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub spot_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<Uuid>,
    pub check_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub cost_cents: Option<i64>,
}

impl ParkingSession {
    pub fn open(vehicle_id: Uuid, spot_id: Uuid, ticket_id: Option<Uuid>, check_in_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            spot_id: Some(spot_id),
            ticket_id,
            check_in_at,
            checked_out_at: None,
            duration_seconds: None,
            cost_cents: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.checked_out_at.is_none()
    }

    pub fn close(&mut self, checked_out_at: DateTime<Utc>, cost_cents: i64) {
        self.duration_seconds = Some((checked_out_at - self.check_in_at).num_seconds());
        self.checked_out_at = Some(checked_out_at);
        self.cost_cents = Some(cost_cents);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(first_name: &str, last_name: &str, email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_lowercase(),
            role,
            created_at: Utc::now(),
        }
    }
}
