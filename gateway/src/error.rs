use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dataset_fetch::FetchError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("URL parameter is required")]
    MissingUrl,
    #[error("Failed to fetch or parse data")]
    Fetch(#[from] FetchError),
    #[error("Geometry unavailable")]
    GeometryUnavailable(String),
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingUrl | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::GeometryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            GatewayError::Fetch(e) => Some(e.to_string()),
            GatewayError::GeometryUnavailable(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}: {:?}", self, self.details());
        }
        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
