// HTTP response utilities - maps dashboard errors to JSON error bodies
use crate::domain::error::DashboardError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Error returned by handlers: either a recoverable dashboard error or a
/// failure of the controller task itself.
#[derive(Debug)]
pub enum ApiError {
    Dashboard(DashboardError),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Dashboard(e) => match e {
                DashboardError::Validation(_) | DashboardError::ExtractionFailure(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
                DashboardError::FetchFailure(_) => StatusCode::BAD_GATEWAY,
                DashboardError::InvalidState(_) => StatusCode::CONFLICT,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        ApiError::Dashboard(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

/// Unreadable request bodies are validation errors like any other bad input.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Dashboard(DashboardError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Dashboard(e) => ErrorBody {
                error: e.kind(),
                message: e.to_string(),
            },
            ApiError::Internal(e) => {
                tracing::error!("Dashboard controller failure: {:#}", e);
                ErrorBody {
                    error: "internal",
                    message: "dashboard controller unavailable".to_string(),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// JSON body extractor whose rejections use the `{error, message}` body
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}
