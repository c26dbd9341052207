use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle transitions, published after the state change is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotEvent {
    #[serde(rename_all = "camelCase")]
    TicketCreated {
        ticket_id: Uuid,
        spot_id: Uuid,
        vehicle_id: Uuid,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    TicketApproved {
        ticket_id: Uuid,
        spot_id: Uuid,
        approved_by_id: Uuid,
        session_id: Uuid,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    TicketRejected {
        ticket_id: Uuid,
        spot_id: Uuid,
        rejected_by_id: Uuid,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    SessionClosed {
        session_id: Uuid,
        spot_id: Option<Uuid>,
        vehicle_id: Uuid,
        duration_seconds: i64,
        cost_cents: i64,
        timestamp: i64,
    },
}

impl LotEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LotEvent::TicketCreated { .. } => "ticket_created",
            LotEvent::TicketApproved { .. } => "ticket_approved",
            LotEvent::TicketRejected { .. } => "ticket_rejected",
            LotEvent::SessionClosed { .. } => "session_closed",
        }
    }
}
