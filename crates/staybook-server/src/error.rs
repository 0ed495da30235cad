use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use staybook_shared::DomainError;
use staybook_store::StoreError;

/// Whether 5xx responses carry the underlying error text.
static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

pub fn set_expose_details(expose: bool) {
    EXPOSE_DETAILS.store(expose, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Map a store error, turning "no rows" into a not-found error for
    /// `what`.
    pub fn from_store(what: &str) -> impl FnOnce(StoreError) -> Self + '_ {
        move |e| match e {
            StoreError::NotFound => Self::not_found(what),
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::not_found("record"),
            StoreError::Overlap => Self::Conflict("room unavailable".into()),
            StoreError::Duplicate(field) => Self::Conflict(format!("duplicate {field}")),
            StoreError::StaleStatus => {
                Self::Conflict("booking status changed concurrently, retry".into())
            }
            other => Self::Persistence(other.to_string()),
        }
    }
}

impl From<DomainError> for ServerError {
    fn from(e: DomainError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(e: PathRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let expose = EXPOSE_DETAILS.load(Ordering::Relaxed);

        let (message, detail) = match &self {
            ServerError::Validation(d)
            | ServerError::NotFound(d)
            | ServerError::Conflict(d)
            | ServerError::Forbidden(d) => (self.to_string(), Some(d.clone())),
            ServerError::Unauthorized => (self.to_string(), None),
            ServerError::Persistence(d) => {
                tracing::error!(error = %d, "Storage failure");
                ("Failed to save changes".to_string(), expose.then(|| d.clone()))
            }
            ServerError::Internal(d) => {
                tracing::error!(error = %d, "Internal failure");
                ("Internal server error".to_string(), expose.then(|| d.clone()))
            }
        };

        let mut body = serde_json::json!({
            "error": message,
        });
        if let Some(detail) = detail {
            body["detail"] = serde_json::Value::String(detail);
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ServerError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_response() {
        let (status, body) = body_json(ServerError::Validation("guest phone is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request: guest phone is required");
        assert_eq!(body["detail"], "guest phone is required");
    }

    #[tokio::test]
    async fn test_persistence_detail_hidden_by_default() {
        let (status, body) = body_json(ServerError::Persistence("disk I/O error".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to save changes");
        assert!(body.get("detail").is_none());
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ServerError::from(StoreError::Overlap),
            ServerError::Conflict(ref m) if m == "room unavailable"
        ));
        assert!(matches!(
            ServerError::from(StoreError::Duplicate("properties.slug".into())),
            ServerError::Conflict(_)
        ));
        assert!(matches!(
            ServerError::from_store("room")(StoreError::NotFound),
            ServerError::NotFound(ref w) if w == "room"
        ));
        assert!(matches!(
            ServerError::from(StoreError::Migration("boom".into())),
            ServerError::Persistence(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServerError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ServerError::not_found("booking").status(), StatusCode::NOT_FOUND);
        assert_eq!(ServerError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }
}
