use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lotkeeper_core::LotError;
use lotkeeper_shared::{Ticket, TicketStatus, VehicleType};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiResult, AppJson, AppPath, AppQuery};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Either `vehicleId` for a known vehicle, or `plateNumber` + `vehicleType`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub vehicle_id: Option<Uuid>,
    pub plate_number: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub spot_id: Uuid,
    pub requested_by_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub approved_by_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub expand: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tickets", get(list_tickets).post(create_ticket))
        .route("/v1/tickets/{id}", get(get_ticket))
        .route("/v1/tickets/{id}/approve", post(approve_ticket))
        .route("/v1/tickets/{id}/reject", post(reject_ticket))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/tickets?status=&expand=
async fn list_tickets(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListTicketsQuery>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let tickets = state.lot.tickets.list_tickets(query.status, query.expand).await?;
    Ok(Json(tickets))
}

/// POST /v1/tickets
async fn create_ticket(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let tickets = &state.lot.tickets;

    let ticket = match (req.vehicle_id, req.plate_number.as_deref(), req.vehicle_type) {
        (Some(vehicle_id), _, _) => {
            tickets
                .create_ticket(vehicle_id, req.spot_id, req.requested_by_id)
                .await?
        }
        (None, Some(plate), Some(vehicle_type)) => {
            tickets
                .request_ticket(plate, vehicle_type, req.spot_id, req.requested_by_id)
                .await?
        }
        _ => {
            return Err(LotError::Validation(
                "either vehicleId or plateNumber with vehicleType is required".into(),
            )
            .into())
        }
    };

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /v1/tickets/:id
async fn get_ticket(
    State(state): State<AppState>,
    AppPath(ticket_id): AppPath<Uuid>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.lot.tickets.get_ticket_expanded(ticket_id).await?))
}

/// POST /v1/tickets/:id/approve
async fn approve_ticket(
    State(state): State<AppState>,
    AppPath(ticket_id): AppPath<Uuid>,
    AppJson(req): AppJson<DecisionRequest>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.lot.tickets.approve(ticket_id, req.approved_by_id).await?))
}

/// POST /v1/tickets/:id/reject
async fn reject_ticket(
    State(state): State<AppState>,
    AppPath(ticket_id): AppPath<Uuid>,
    AppJson(req): AppJson<DecisionRequest>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.lot.tickets.reject(ticket_id, req.approved_by_id).await?))
}
