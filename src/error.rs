//! Ошибки операций над местами и их отображение в HTTP-ответы.
//!
//! Все варианты - ожидаемые отказы, которые вызывающая сторона получает как
//! есть. Реестр ничего не повторяет сам.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::SeatId;

const MISSING_CLAIMANT: &str = "User ID is required.";
const SEAT_NOT_FOUND: &str = "Seat not found.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    #[error("claimant id is missing or empty")]
    InvalidClaimant,

    #[error("seat {0} not found")]
    NotFound(SeatId),

    #[error("seat {0} is already booked")]
    AlreadyBooked(SeatId),

    #[error("seat {0} is locked by an active claimant")]
    AlreadyLocked(SeatId),
}

impl LockError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LockError::InvalidClaimant => StatusCode::BAD_REQUEST,
            LockError::NotFound(_) => StatusCode::NOT_FOUND,
            LockError::AlreadyBooked(_) | LockError::AlreadyLocked(_) => StatusCode::CONFLICT,
        }
    }

    pub fn message(&self) -> String {
        match self {
            LockError::InvalidClaimant => MISSING_CLAIMANT.to_string(),
            LockError::NotFound(_) => SEAT_NOT_FOUND.to_string(),
            LockError::AlreadyBooked(id) => format!("Seat {} is already booked.", id),
            LockError::AlreadyLocked(id) => {
                format!("Seat {} is currently locked by another user.", id)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfirmError {
    #[error("claimant id is missing or empty")]
    InvalidClaimant,

    #[error("seat {0} not found")]
    NotFound(SeatId),

    #[error("seat {0} is not locked")]
    NotLocked(SeatId),

    #[error("seat {0} is locked by a different claimant")]
    ForbiddenClaimant(SeatId),

    #[error("lock on seat {0} has expired")]
    LockExpired(SeatId),
}

impl ConfirmError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConfirmError::InvalidClaimant => StatusCode::BAD_REQUEST,
            ConfirmError::NotFound(_) => StatusCode::NOT_FOUND,
            ConfirmError::ForbiddenClaimant(_) => StatusCode::FORBIDDEN,
            ConfirmError::NotLocked(_) | ConfirmError::LockExpired(_) => StatusCode::CONFLICT,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ConfirmError::InvalidClaimant => MISSING_CLAIMANT.to_string(),
            ConfirmError::NotFound(_) => SEAT_NOT_FOUND.to_string(),
            ConfirmError::NotLocked(_) => {
                "Seat must be locked before confirming. This seat is currently booked or available."
                    .to_string()
            }
            ConfirmError::ForbiddenClaimant(_) => "This seat is locked by another user.".to_string(),
            ConfirmError::LockExpired(_) => {
                "Your lock on the seat has expired. Please lock it again.".to_string()
            }
        }
    }
}

fn message_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

impl IntoResponse for LockError {
    fn into_response(self) -> Response {
        message_response(self.status_code(), self.message())
    }
}

impl IntoResponse for ConfirmError {
    fn into_response(self) -> Response {
        message_response(self.status_code(), self.message())
    }
}
