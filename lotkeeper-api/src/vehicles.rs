use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use lotkeeper_shared::{Vehicle, VehicleType};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiResult, AppJson, AppPath};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectTypeRequest {
    pub actor_id: Uuid,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/vehicles", get(list_vehicles))
        .route("/v1/vehicles/{id}", get(get_vehicle))
        .route("/v1/vehicles/{id}/type", patch(correct_type))
}

async fn list_vehicles(State(state): State<AppState>) -> ApiResult<Json<Vec<Vehicle>>> {
    Ok(Json(state.lot.vehicles.list_vehicles().await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    AppPath(vehicle_id): AppPath<Uuid>,
) -> ApiResult<Json<Vehicle>> {
    Ok(Json(state.lot.vehicles.get_vehicle(vehicle_id).await?))
}

/// PATCH /v1/vehicles/:id/type (admin)
async fn correct_type(
    State(state): State<AppState>,
    AppPath(vehicle_id): AppPath<Uuid>,
    AppJson(req): AppJson<CorrectTypeRequest>,
) -> ApiResult<Json<Vehicle>> {
    let vehicle = state
        .lot
        .vehicles
        .correct_type(vehicle_id, req.vehicle_type, req.actor_id)
        .await?;
    Ok(Json(vehicle))
}
