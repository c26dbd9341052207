use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lotkeeper_shared::{Role, User};
use lotkeeper_ticketing::NewUser;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiResult, AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub actor_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(list_users).post(create_user))
        .route("/v1/users/{id}", get(get_user))
}

/// GET /v1/users?role= ; `role=ATTENDANT` backs the attendants page
async fn list_users(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListUsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.lot.users.list_users(query.role).await?))
}

/// POST /v1/users (admin)
async fn create_user(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .lot
        .users
        .create_user(
            req.actor_id,
            NewUser {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                role: req.role,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/users/:id
async fn get_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.lot.users.get_user(user_id).await?))
}
