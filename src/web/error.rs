use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::services::tag_service::TAG_CAP;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Account already exists")]
    AccountExists,
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Email not confirmed")]
    EmailNotConfirmed,
    #[error("Could not validate credentials")]
    InvalidCredentials,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("A photo can carry at most {TAG_CAP} tags")]
    TagLimitExceeded,
    #[error("All of the requested tags are already attached")]
    NoNewTags,
    #[error("None of the requested tags are attached")]
    NoMatchingTags,
    #[error("Photo not found")]
    PhotoNotFound,
    #[error("Comment not found")]
    CommentNotFound,
    #[error("Contact not found")]
    ContactNotFound,
    #[error("Too many requests")]
    RateLimited,
    #[error("Image host error: {0}")]
    ImageHost(String),
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
    #[error("JWT creation failed: {0}")]
    TokenCreation(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::AccountExists => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidEmail
            | AppError::InvalidPassword
            | AppError::EmailNotConfirmed
            | AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::TagLimitExceeded | AppError::NoNewTags | AppError::NoMatchingTags => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::PhotoNotFound | AppError::CommentNotFound | AppError::ContactNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::ImageHost(msg) => (StatusCode::BAD_GATEWAY, format!("Image host error: {msg}")),
            AppError::PasswordHashing(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Password hashing error: {msg}"),
            ),
            AppError::TokenCreation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Token creation error: {msg}"),
            ),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {msg}"),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON serialization/deserialization error: {err}"))
    }
}
