use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod dashboard;
pub mod error;
pub mod events;
pub mod sessions;
pub mod spots;
pub mod state;
pub mod tickets;
pub mod users;
pub mod vehicles;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(dashboard::routes())
        .merge(spots::routes())
        .merge(vehicles::routes())
        .merge(tickets::routes())
        .merge(sessions::routes())
        .merge(users::routes())
        .merge(events::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
