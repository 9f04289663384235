use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error};
use serde::Serialize;

use crate::entity::DashboardError;

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorServer {
    pub message: String,
    pub status: u16,
}

impl ErrorServer {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST.into(),
        }
    }
}

impl std::fmt::Display for ErrorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for ErrorServer {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<DashboardError> for ErrorServer {
    fn from(err: DashboardError) -> Self {
        let status = match &err {
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DashboardError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DashboardError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match err {
            DashboardError::Database(e) => {
                error!("Database error: {}", e);
                "Internal database error".to_string()
            }
            other => other.to_string(),
        };

        Self {
            message,
            status: status.into(),
        }
    }
}

impl From<QueryRejection> for ErrorServer {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {}", rejection.body_text());
        Self {
            message: rejection.body_text(),
            status: rejection.status().as_u16(),
        }
    }
}

impl From<PathRejection> for ErrorServer {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path parameters: {}", rejection.body_text());
        Self {
            message: rejection.body_text(),
            status: rejection.status().as_u16(),
        }
    }
}
