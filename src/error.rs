use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::services::payment::PaymentError;

/// Message raised by the `bookings_no_overlap` trigger.
pub const ROOM_UNAVAILABLE: &str = "room_unavailable";

pub type Result<T> = std::result::Result<T, BookingError>;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Payment provider error: {0}")]
    Upstream(#[from] PaymentError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Stable, machine-checkable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::Forbidden(_) => "FORBIDDEN",
            BookingError::Conflict(_) => "CONFLICT",
            BookingError::Unauthorized(_) => "UNAUTHORIZED",
            BookingError::BadRequest(_) => "BAD_REQUEST",
            BookingError::Upstream(_) => "UPSTREAM_ERROR",
            BookingError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.message().contains(ROOM_UNAVAILABLE) {
                return BookingError::Conflict(
                    "Room is not available for selected dates".to_string(),
                );
            }
        }
        log::error!("Database error: {}", err);
        BookingError::Internal("Database error".to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: String,
    kind: &'a str,
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BookingError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BookingError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        })
    }
}
