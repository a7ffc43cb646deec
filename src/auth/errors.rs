use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by a [`UserStore`](super::repo::UserStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    UniqueViolation,
    #[error("user {0} not found")]
    Missing(Uuid),
    #[error("corrupt user row: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
            _ => StoreError::Database(e),
        }
    }
}

/// Business errors for the register / login / lookup workflows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("user already exists")]
    AlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(#[source] StoreError),
    #[error("operation cancelled")]
    Cancelled,
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            // the only unique column is email
            StoreError::UniqueViolation => AuthError::AlreadyExists,
            other => AuthError::Store(other),
        }
    }
}

impl AuthError {
    /// Stable short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::AlreadyExists => "already_exists",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::NotFound => "not_found",
            AuthError::Store(_) => "store_error",
            AuthError::Cancelled => "cancelled",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::AlreadyExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to show to API clients. Store details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::AlreadyExists => "user already exists".into(),
            AuthError::InvalidCredentials => "invalid credentials".into(),
            AuthError::NotFound => "user not found".into(),
            AuthError::Store(_) => "internal server error".into(),
            AuthError::Cancelled => "request cancelled".into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(kind = self.kind(), %status, "request failed");
        (status, Json(serde_json::json!({ "error": self.public_message() }))).into_response()
    }
}
