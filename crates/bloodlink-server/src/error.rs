use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use bloodlink_shared::notify::Notification;
use bloodlink_shared::ValidationError;
use bloodlink_store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Not signed in")]
    Unauthorized,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Reset link is invalid or has expired")]
    InvalidResetToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// The submitted body did not have the form's shape.
    #[error("{0}")]
    MalformedForm(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ProfileNotFound => StatusCode::PRECONDITION_FAILED,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::InvalidResetToken | AppError::Validation(_) | AppError::MalformedForm(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Store(StoreError::MissingReference(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the user. Internal failures are logged and
    /// replaced by a generic line.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Store(StoreError::NotFound) => "Record not found".to_string(),
            AppError::Store(e @ (StoreError::Duplicate(_) | StoreError::MissingReference(_))) => {
                e.to_string()
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                "Database error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    notification: Notification,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.public_message();
        let body = ErrorBody {
            notification: Notification::error(message.clone()),
            error: message,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// A rejected form submission. The submitted values come back unchanged so
/// the client can offer them for another try.
#[derive(Debug)]
pub struct FormError<F> {
    pub error: AppError,
    /// Toast for rejections that reached the store; local refusals have none.
    pub toast: Option<&'static str>,
    pub form: F,
}

impl<F> FormError<F> {
    /// Refused before anything was sent to the store.
    pub fn local(error: impl Into<AppError>, form: F) -> Self {
        Self {
            error: error.into(),
            toast: None,
            form,
        }
    }

    /// The store rejected the write.
    pub fn rejected(error: impl Into<AppError>, toast: &'static str, form: F) -> Self {
        Self {
            error: error.into(),
            toast: Some(toast),
            form,
        }
    }
}

#[derive(Serialize)]
struct FormErrorBody<F> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<Notification>,
    form: F,
}

impl<F: Serialize> IntoResponse for FormError<F> {
    fn into_response(self) -> Response {
        let body = FormErrorBody {
            error: self.error.public_message(),
            notification: self.toast.map(Notification::error),
            form: self.form,
        };

        (self.error.status(), Json(body)).into_response()
    }
}
