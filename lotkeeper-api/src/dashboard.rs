use axum::{extract::State, routing::get, Json, Router};
use lotkeeper_ticketing::LotSummary;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/dashboard", get(summary))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /v1/dashboard
async fn summary(State(state): State<AppState>) -> ApiResult<Json<LotSummary>> {
    Ok(Json(state.lot.summary().await?))
}
