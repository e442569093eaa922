use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::db::services::StoreError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid body: {0}")]
    InvalidBody(String),
    #[error("Not Found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_)
            | AppError::InvalidFilter(_)
            | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::InvalidIdentifier(msg)
            | AppError::InvalidFilter(msg)
            | AppError::InvalidBody(msg) => msg.clone(),
            AppError::NotFound => "Not Found".to_string(),
            // Details stay in the log.
            AppError::Database(_) => {
                error!(error = %self, "Request failed.");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            StoreError::Constraint(msg) => AppError::InvalidBody(msg),
            StoreError::Persistence(db_err) => AppError::Database(db_err.to_string()),
        }
    }
}
