use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{checkout::SubmissionError, lifecycle::LifecycleError, response::ApiResponse};

/// Login failures collapse onto a small set of user-facing categories instead
/// of leaking backend detail.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no account exists for this email")]
    UnknownAccount,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("too many login attempts; try again later")]
    RateLimited,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("upstream collaborator failed: {0}")]
    Collaborator(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::IllegalTransition { .. } => AppError::Conflict(err.to_string()),
            LifecycleError::MissingPaymentSlip => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(v) => AppError::Unprocessable(v.to_string()),
            SubmissionError::Upload(source) => {
                AppError::Collaborator(format!("payment slip upload failed: {source}"))
            }
            SubmissionError::OrderCreate(source) => {
                AppError::Collaborator(format!("order could not be recorded: {source}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Auth(AuthError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Collaborator(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, axum::Json(ApiResponse::error(self.to_string()))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
