use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lotkeeper_shared::{ParkingSpot, SpotStatus, VehicleType};
use lotkeeper_ticketing::{NewSpot, SpotFilter};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiResult, AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSpotsQuery {
    pub status: Option<SpotStatus>,
    pub section: Option<String>,
    #[serde(rename = "type")]
    pub spot_type: Option<VehicleType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpotRequest {
    pub actor_id: Uuid,
    pub section: String,
    pub number: u32,
    #[serde(rename = "type")]
    pub spot_type: VehicleType,
    pub label: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/spots", get(list_spots).post(create_spot))
        .route("/v1/spots/{id}", get(get_spot))
}

/// GET /v1/spots?status=&section=&type=
async fn list_spots(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListSpotsQuery>,
) -> ApiResult<Json<Vec<ParkingSpot>>> {
    let filter = SpotFilter {
        status: query.status,
        section: query.section,
        spot_type: query.spot_type,
    };
    Ok(Json(state.lot.spots.list_spots(&filter).await?))
}

/// POST /v1/spots (admin)
async fn create_spot(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateSpotRequest>,
) -> ApiResult<(StatusCode, Json<ParkingSpot>)> {
    let spot = state
        .lot
        .spots
        .register_spot(
            req.actor_id,
            NewSpot {
                section: req.section,
                number: req.number,
                spot_type: req.spot_type,
                label: req.label,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(spot)))
}

/// GET /v1/spots/:id
async fn get_spot(
    State(state): State<AppState>,
    AppPath(spot_id): AppPath<Uuid>,
) -> ApiResult<Json<ParkingSpot>> {
    Ok(Json(state.lot.spots.get_spot(spot_id).await?))
}
