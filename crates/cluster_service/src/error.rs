use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geocluster::{ClusterError, ValidationError};
use serde::Serialize;

/// Error body shared by every API route:
/// `{ "code", "message", "details": [{ "field", "message" }] }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Vec<ValidationError>,
}

impl ApiError {
    pub fn validation(details: Vec<ValidationError>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR",
            message: "Request parameters failed validation".into(),
            details,
        }
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND",
            message: format!("{what} {id} not found"),
            details: Vec::new(),
        }
    }

    pub fn catalog_unavailable(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "CATALOG_UNAVAILABLE",
            message,
            details: Vec::new(),
        }
    }
}

impl From<ClusterError> for ApiError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::Validation(details) => Self::validation(details),
            ClusterError::Catalog(e) => {
                tracing::error!(error = %e, "Catalog query failed");
                Self::catalog_unavailable(e.to_string())
            }
        }
    }
}

impl From<geocluster::CatalogError> for ApiError {
    fn from(err: geocluster::CatalogError) -> Self {
        ClusterError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
