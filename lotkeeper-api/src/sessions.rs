use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use lotkeeper_shared::ParkingSession;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiResult, AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default)]
    pub open: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub vehicle_id: Uuid,
    pub spot_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Defaults to now
    pub checkout_at: Option<DateTime<Utc>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", get(list_sessions).post(open_session))
        .route("/v1/sessions/{id}", get(get_session))
        .route("/v1/sessions/{id}/checkout", post(checkout))
}

/// GET /v1/sessions?open=true lists the cars currently parked
async fn list_sessions(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListSessionsQuery>,
) -> ApiResult<Json<Vec<ParkingSession>>> {
    Ok(Json(state.lot.sessions.list_sessions(query.open).await?))
}

/// POST /v1/sessions
async fn open_session(
    State(state): State<AppState>,
    AppJson(req): AppJson<OpenSessionRequest>,
) -> ApiResult<(StatusCode, Json<ParkingSession>)> {
    let session = state.lot.sessions.open_session(req.vehicle_id, req.spot_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /v1/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<Uuid>,
) -> ApiResult<Json<ParkingSession>> {
    Ok(Json(state.lot.sessions.get_session(session_id).await?))
}

/// POST /v1/sessions/:id/checkout; the body is optional
async fn checkout(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<Uuid>,
    body: Option<AppJson<CheckoutRequest>>,
) -> ApiResult<Json<ParkingSession>> {
    let at = body
        .and_then(|AppJson(req)| req.checkout_at)
        .unwrap_or_else(Utc::now);
    Ok(Json(state.lot.sessions.close_session(session_id, at).await?))
}
