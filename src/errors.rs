use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("you do not have permission to access this booking")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot update a finalized booking")]
    Finalized,

    #[error("booking is already finalized")]
    AlreadyFinalized,

    #[error("edit window expired: date and time can only be changed within 24 hours of booking")]
    EditWindowExpired,

    #[error("cancellation window expired: bookings can only be cancelled within 24 hours of booking")]
    CancelWindowExpired,

    #[error("cannot move a booking from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn invalid_transition(from: BookingStatus, to: BookingStatus) -> Self {
        AppError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }
    }

    /// Stable identifier the UI can switch on.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::Conflict(_) => "slot_taken",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Finalized => "booking_finalized",
            AppError::AlreadyFinalized => "already_finalized",
            AppError::EditWindowExpired => "edit_window_expired",
            AppError::CancelWindowExpired => "cancel_window_expired",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::Unauthorized => "unauthorized",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::Conflict(_) => Some("Check the available slots for that day and pick another time."),
            AppError::Finalized | AppError::AlreadyFinalized => {
                Some("Completed or cancelled bookings can't be changed. Make a new booking instead.")
            }
            AppError::EditWindowExpired => {
                Some("You can still update contact details, service or notes. Contact the salon to reschedule.")
            }
            AppError::CancelWindowExpired => Some("Contact the salon to cancel this booking."),
            AppError::Unauthorized => Some("Sign in and try again."),
            AppError::Internal(_) => Some("Please try again in a moment."),
            _ => None,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Finalized | AppError::AlreadyFinalized => StatusCode::CONFLICT,
            AppError::EditWindowExpired | AppError::CancelWindowExpired => StatusCode::FORBIDDEN,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal failure");
                "Something went wrong, please try again.".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({ "error": message, "code": self.code() });
        if let AppError::Validation { field, .. } = &self {
            body["field"] = json!(field);
        }
        if let Some(hint) = self.hint() {
            body["hint"] = json!(hint);
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_carries_field() {
        let (status, body) = body_json(AppError::validation("notes", "notes too short")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "notes");
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["error"], "notes too short");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) = body_json(AppError::Internal(anyhow::anyhow!("disk on fire"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Something went wrong, please try again.");
        assert!(!body.to_string().contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_storage_failures_render_as_internal() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: AppError = crate::db::queries::get_booking_by_id(&conn, "b-1")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Internal(_)));

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "internal_error");
        assert!(!body.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn test_conflict_suggests_next_step() {
        let (status, body) = body_json(AppError::Conflict("slot taken".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "slot_taken");
        assert!(body["hint"].as_str().unwrap().contains("available slots"));
    }
}
