use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::jobs::JobError;
use crate::notices::NoticeError;
use crate::otp::OtpError;
use crate::profile::ProfileError;
use crate::storage::StoreError;
use crate::uploads::UploadError;
use crate::validation::FieldErrors;
use crate::workflow::{TransitionError, WorkflowError};

/// Everything a handler can fail with, already classified by status code.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden,
    NotFound(String),
    BadRequest(String),
    Validation(FieldErrors),
    PayloadTooLarge(String),
    /// Logged in full, returned as a generic message.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Unauthorized => json!({ "message": "Unauthorized" }),
            ApiError::Forbidden => json!({ "message": "Access denied" }),
            ApiError::NotFound(message)
            | ApiError::BadRequest(message)
            | ApiError::PayloadTooLarge(message) => json!({ "message": message }),
            ApiError::Validation(errors) => json!({
                "message": "Validation failed",
                "errors": errors,
            }),
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                json!({ "message": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::Conflict(message) => ApiError::BadRequest(message),
            StoreError::Unavailable(_) | StoreError::Database(_) => ApiError::internal(err),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::JobNotFound | WorkflowError::ApplicationNotFound => {
                ApiError::NotFound(err.to_string())
            }
            WorkflowError::Transition(TransitionError::ActorNotPermitted { .. }) => {
                ApiError::Forbidden
            }
            WorkflowError::JobClosed
            | WorkflowError::DuplicateApplication
            | WorkflowError::Transition(_)
            | WorkflowError::Score(_)
            | WorkflowError::RemarksRequired
            | WorkflowError::ScoreRequired
            | WorkflowError::UnexpectedScore
            | WorkflowError::ConcurrentUpdate(_) => ApiError::BadRequest(err.to_string()),
            WorkflowError::Store(inner) => inner.into(),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Validation(errors) => ApiError::Validation(errors),
            ProfileError::NotFound => ApiError::NotFound(err.to_string()),
            ProfileError::AlreadyExists | ProfileError::PhoneNotVerified => {
                ApiError::BadRequest(err.to_string())
            }
            ProfileError::Store(inner) => inner.into(),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(errors) => ApiError::Validation(errors),
            JobError::NotFound => ApiError::NotFound(err.to_string()),
            JobError::Store(inner) => inner.into(),
        }
    }
}

impl From<NoticeError> for ApiError {
    fn from(err: NoticeError) -> Self {
        match err {
            NoticeError::Validation(errors) => ApiError::Validation(errors),
            NoticeError::NotFound => ApiError::NotFound(err.to_string()),
            NoticeError::Store(inner) => inner.into(),
        }
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::MissingPhoneNumber => ApiError::BadRequest(err.to_string()),
            OtpError::Store(inner) => inner.into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NoFile | UploadError::UnsupportedType(_) => {
                ApiError::BadRequest(err.to_string())
            }
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            UploadError::Io(_) => ApiError::internal(err),
        }
    }
}
