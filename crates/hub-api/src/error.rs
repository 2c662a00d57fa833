use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use hub_types::api::ErrorBody;

/// Every failure a handler can report. Authentication and authorization
/// variants carry fixed, generic messages so responses never reveal which
/// check failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad input; reports the first field that failed.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    /// Login failure. Same body for unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    Conflict,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not allowed")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Too many requests, please try again later")]
    TooManyRequests,

    /// Unexpected collaborator failure. Logged in full, answered generically.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: &'static str) -> Self {
        Self::Validation { field, message }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Unwrap a JSON request body. A body that is not JSON, or not an object,
/// is answered with `err` instead of axum's plain-text rejection.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>, err: ApiError) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(err)
        }
    }
}

/// The rejection used where a body has no better field to blame.
pub fn malformed_body() -> ApiError {
    ApiError::validation("body", "Malformed request body")
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {}", e);
        Self::Internal(anyhow::anyhow!("blocking task failed"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!("Internal error: {:#}", source);
        }

        let field = match &self {
            Self::Validation { field, .. } => Some(field.to_string()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            field,
        };
        (self.status(), Json(body)).into_response()
    }
}
