use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// Missing or invalid input; the caller can fix it.
    #[error("{0}")]
    Validation(String),

    /// No entry with this id; holds the id as the caller sent it.
    #[error("Banana not found")]
    NotFound(String),

    /// The persistence backend could not complete the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type IndexResult<T> = Result<T, IndexError>;

impl IndexError {
    pub fn status(&self) -> StatusCode {
        match self {
            IndexError::Validation(_) => StatusCode::BAD_REQUEST,
            IndexError::NotFound(_) => StatusCode::NOT_FOUND,
            IndexError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for IndexError {
    fn from(err: rusqlite::Error) -> Self {
        IndexError::Unavailable(err.to_string())
    }
}

impl From<tokio::task::JoinError> for IndexError {
    fn from(err: tokio::task::JoinError) -> Self {
        IndexError::Unavailable(format!("storage task failed: {err}"))
    }
}

impl From<JsonRejection> for IndexError {
    fn from(rejection: JsonRejection) -> Self {
        IndexError::Validation(rejection.body_text())
    }
}

impl IntoResponse for IndexError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            IndexError::Unavailable(reason) => tracing::error!("Backend fault: {reason}"),
            IndexError::NotFound(id) => tracing::debug!("No entry with id {id}"),
            IndexError::Validation(reason) => tracing::debug!("Rejected request: {reason}"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
