use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;

use crate::model::Status;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized user")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("you're not a member of this chat room")]
    Forbidden,

    #[error("chat with these members already exist")]
    Conflict,

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn invalid_message() -> Self {
        Self::BadRequest("invalid message received".to_owned())
    }

    pub fn status_code(&self) -> StatusCode {
        use AppError::*;
        match self {
            Unauthorized => StatusCode::UNAUTHORIZED,
            BadRequest(_) => StatusCode::BAD_REQUEST,
            NotFound(_) => StatusCode::NOT_FOUND,
            Forbidden => StatusCode::FORBIDDEN,
            Conflict => StatusCode::CONFLICT,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope reported back to the client. Internal causes stay in the logs.
    pub fn status(&self) -> Status {
        match self {
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal failure");
                Status::new("internal server error")
            }
            err => Status::new(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.status())).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(serde_json::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(axum::Error);
apperr_impl!(reqwest::Error);
apperr_impl!(tokio::task::JoinError);
apperr_impl!(time::error::ComponentRange);
apperr_impl!(uuid::Error);
