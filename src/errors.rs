use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::pagination::ListError;
use crate::store::StoreError;

/// Boundary error taxonomy. The listing endpoints answer with a bare
/// `{ msg }` body; the CRUD endpoints keep the `{ status: "ERROR", ... }`
/// envelope their clients expect. An empty listing result is never an
/// error; only the singular lookups map absence to 404.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Listing-contract client error: `400 { msg }`.
    #[error("{0}")]
    BadRequest(String),
    /// CRUD-contract client error: `400 { status, msg }`.
    #[error("{0}")]
    Invalid(String),
    /// Singular lookup miss: `404 { status, msg }`.
    #[error("{0}")]
    NotFound(String),
    /// Store failure on a listing path: `500 { msg, error }`.
    #[error("Error al obtener productos: {0}")]
    ListFailed(#[source] StoreError),
    /// Store failure on a CRUD path: `500 { status, msg, causa }`.
    #[error("Error procesando operación: {0}")]
    OpFailed(#[source] StoreError),
}

impl From<ListError> for ApiError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::Store(cause) => ApiError::ListFailed(cause),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ListFailed(_) | ApiError::OpFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::BadRequest(msg) => json!({ "msg": msg }),
            ApiError::Invalid(msg) => json!({ "status": "ERROR", "msg": msg }),
            ApiError::NotFound(msg) => json!({ "status": "ERROR", "msg": msg }),
            ApiError::ListFailed(cause) => {
                log::error!("store failure while listing: {}", cause);
                json!({ "msg": "Error al obtener productos", "error": cause.to_string() })
            }
            ApiError::OpFailed(cause) => {
                log::error!("store failure: {}", cause);
                json!({
                    "status": "ERROR",
                    "msg": "Error procesando operación",
                    "causa": cause.to_string(),
                })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_limit_maps_to_bad_request_with_exact_message() {
        let err: ApiError = ListError::InvalidLimit.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "limit must be > 0"));
    }

    #[test]
    fn store_failure_maps_to_internal_error() {
        let err: ApiError = ListError::Store(StoreError::Query(sqlx::Error::RowNotFound)).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
