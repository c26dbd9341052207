use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, OptionalFromRequest, Request,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lotkeeper_core::LotError;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Error returned by every handler; the body carries `LotError::kind()`.
#[derive(Debug)]
pub struct AppError(pub LotError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            LotError::NotFound { .. } => StatusCode::NOT_FOUND,
            LotError::Conflict(_) | LotError::InvalidState { .. } => StatusCode::CONFLICT,
            LotError::Validation(_) => StatusCode::BAD_REQUEST,
            LotError::Authorization(_) => StatusCode::FORBIDDEN,
            LotError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self.0 {
            LotError::Storage(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.0.kind(),
        }));

        (status, body).into_response()
    }
}

impl From<LotError> for AppError {
    fn from(err: LotError) -> Self {
        AppError(err)
    }
}

// Malformed bodies, ids and out-of-set enum values are validation failures, not 422s.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(LotError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(LotError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError(LotError::Validation(rejection.body_text()))
    }
}

/// `Json` whose rejections go through `AppError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

// `Option<AppJson<T>>` is `None` when the request has no JSON body at all.
impl<T, S> OptionalFromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let json = <Json<T> as OptionalFromRequest<S>>::from_request(req, state).await?;
        Ok(json.map(|Json(value)| AppJson(value)))
    }
}

/// `Query` whose rejections go through `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `Path` whose rejections go through `AppError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

pub type ApiResult<T> = Result<T, AppError>;
