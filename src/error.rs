use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_login::tower_sessions::session;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Session error: {0}")]
    Session(#[from] session::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error("You must be logged in")]
    Unauthorized,

    #[error("You do not have access to this page")]
    Forbidden,

    #[error("Not found")]
    NotFound,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Session(_)
            | AppError::Storage(_)
            | AppError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected ({status}): {self}");
        }

        (status, self.to_string()).into_response()
    }
}
