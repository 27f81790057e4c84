// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::error::{ErrorKind, WriteFailure};
use serde_json::json;
use thiserror::Error;

use crate::services::roster::RosterRejection;
use crate::services::team_builder::TeamRejection;

/// Server error code MongoDB reports for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error(transparent)]
    TeamRejected(#[from] TeamRejection),

    #[error(transparent)]
    RosterRejected(#[from] RosterRejection),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication required")]
    AuthError,

    #[error("{0}")]
    Forbidden(String),

    #[error("Could not allocate a unique referral id after {0} attempts")]
    ReferralExhausted(u32),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(e) => {
                tracing::error!("database failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::TeamRejected(_)
            | AppError::RosterRejected(_)
            | AppError::ValidationError(_)
            | AppError::Conflict(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidObjectId(_) => (StatusCode::BAD_REQUEST, "Invalid ID format".to_string()),
            AppError::AuthError => (StatusCode::UNAUTHORIZED, "Authentication failed".to_string()),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::ReferralExhausted(_) => {
                tracing::error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Referral id space exhausted".to_string())
            }
            AppError::ConfigurationError(_) | AppError::Internal(_) => {
                tracing::error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::AuthError
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", err))
    }
}

impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }
}

/// True when the store rejected a write because of a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => is_duplicate_key_code(e.code),
        ErrorKind::Command(e) => is_duplicate_key_code(e.code),
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()
            .map(|errors| errors.iter().any(|w| is_duplicate_key_code(w.code)))
            .unwrap_or(false),
        _ => false,
    }
}

fn is_duplicate_key_code(code: i32) -> bool {
    code == DUPLICATE_KEY_CODE
}

/// Maps a unique index violation to the domain error `on_duplicate` builds,
/// leaving every other store failure as a database error.
pub fn translate_duplicate(
    err: mongodb::error::Error,
    on_duplicate: impl FnOnce() -> AppError,
) -> AppError {
    if is_duplicate_key(&err) {
        on_duplicate()
    } else {
        AppError::MongoDB(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
