// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::StatsError;
use crate::services::BackendError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid request body: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Malformed group record: {0}")]
    MalformedRecord(#[from] StatsError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// Status code and stable error tag for the response body.
    fn status_and_tag(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::Backend(err) => match err {
                BackendError::InvalidInviteCode => {
                    (StatusCode::BAD_REQUEST, "invalid_invite_code")
                }
                BackendError::NotCreator => (StatusCode::FORBIDDEN, "not_creator"),
                BackendError::AlreadyMember => (StatusCode::CONFLICT, "already_member"),
                BackendError::CreatorCannotLeave => {
                    (StatusCode::CONFLICT, "creator_cannot_leave")
                }
                BackendError::DivisionNotCustom => (StatusCode::CONFLICT, "division_not_custom"),
                BackendError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                BackendError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
                BackendError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
                BackendError::Transport(_)
                | BackendError::Decode(_)
                | BackendError::Rejected { .. } => (StatusCode::BAD_GATEWAY, "backend_error"),
            },
            AppError::MalformedRecord(_) => (StatusCode::BAD_GATEWAY, "malformed_record"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Details safe to show the client.
    fn details(&self) -> Option<String> {
        match self {
            AppError::Forbidden(msg) | AppError::BadRequest(msg) => Some(msg.clone()),
            AppError::Validation(errors) => Some(errors.to_string()),
            AppError::Backend(BackendError::NotFound(msg)) => Some(msg.clone()),
            AppError::Backend(
                err @ (BackendError::InvalidInviteCode
                | BackendError::NotCreator
                | BackendError::AlreadyMember
                | BackendError::CreatorCannotLeave
                | BackendError::DivisionNotCustom),
            ) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_tag();

        match &self {
            AppError::Backend(err) if err.is_transient() => {
                tracing::warn!(error = %err, "Transient backend error");
            }
            AppError::Backend(err) if status.is_server_error() => {
                tracing::error!(error = %err, "Backend error");
            }
            AppError::MalformedRecord(err) => {
                tracing::error!(error = %err, "Backend returned a malformed group record");
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: error.to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rule_errors_map_to_client_statuses() {
        let cases = [
            (BackendError::InvalidInviteCode, StatusCode::BAD_REQUEST),
            (BackendError::NotCreator, StatusCode::FORBIDDEN),
            (BackendError::AlreadyMember, StatusCode::CONFLICT),
            (BackendError::CreatorCannotLeave, StatusCode::CONFLICT),
            (BackendError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                BackendError::Transport("timeout".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_backend_internals_are_not_leaked() {
        let err = AppError::Backend(BackendError::Rejected {
            code: "42P01".to_string(),
            message: "relation \"secret_table\" does not exist".to_string(),
        });
        assert_eq!(err.details(), None);
    }

    #[test]
    fn test_malformed_record_is_bad_gateway() {
        let err = AppError::from(StatsError::InvalidGoalAmount(-1.0));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
