use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path is outside the served root")]
    PathTraversal,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Failed to open directory {path}: {source}")]
    DirectoryOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory operation not allowed on file")]
    NotADirectory,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to generate QR code: {0}")]
    Qr(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Failed to open folder: {0}")]
    OpenFolder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl ShareError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ShareError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ShareError::PathTraversal => (StatusCode::FORBIDDEN, "PATH_TRAVERSAL"),
            ShareError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ShareError::DirectoryOpen { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DIRECTORY_OPEN_FAILED")
            }
            ShareError::NotADirectory => (StatusCode::BAD_REQUEST, "NOT_A_DIRECTORY"),
            ShareError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ShareError::Qr(_) => (StatusCode::INTERNAL_SERVER_ERROR, "QR_FAILED"),
            ShareError::Settings(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SETTINGS_ERROR"),
            ShareError::OpenFolder(_) => (StatusCode::INTERNAL_SERVER_ERROR, "OPEN_FOLDER_FAILED"),
            ShareError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };

        (status, Json(body)).into_response()
    }
}
