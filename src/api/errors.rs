use crate::storage::loader::LoadError;
use crate::viewer::ViewerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// API error type with HTTP status code mapping.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    /// A data file could not be loaded; the message names the file.
    DataLoad(LoadError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
            Self::DataLoad(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::DataLoad(e) => {
                tracing::error!(url = %e.url, error = %e.kind, "Data load failed");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        Self::DataLoad(e)
    }
}

impl From<ViewerError> for ApiError {
    fn from(e: ViewerError) -> Self {
        match e {
            ViewerError::Load(e) => Self::DataLoad(e),
            ViewerError::NoSiteSelected | ViewerError::NoSites => Self::NotFound(e.to_string()),
            ViewerError::NoPeriods { .. }
            | ViewerError::InvalidPeriod(_)
            | ViewerError::UnknownPeriod { .. } => Self::BadRequest(e.to_string()),
        }
    }
}
