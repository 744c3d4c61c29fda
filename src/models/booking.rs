use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    /// Set by the stay-completion process outside this service.
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    /// Works out what `transition` does to a booking currently in `self`.
    ///
    /// Status only moves forward. Re-applying a transition whose target has
    /// already been reached is a `Noop`; anything that would move a booking
    /// backwards or out of a terminal state is rejected.
    pub fn apply(self, transition: Transition) -> Result<Step, InvalidTransition> {
        use BookingStatus::*;

        match (self, transition) {
            (Pending, Transition::Confirm) => Ok(Step::Apply(Confirmed)),
            (Pending, Transition::Lapse) => Ok(Step::Apply(Cancelled)),
            (Pending | Confirmed, Transition::Cancel) => Ok(Step::Apply(Cancelled)),
            (Confirmed, Transition::Confirm) => Ok(Step::Noop),
            (Cancelled, Transition::Lapse) => Ok(Step::Noop),
            (Cancelled, Transition::Cancel) => Err(InvalidTransition {
                from: self,
                transition,
                reason: "Booking is already cancelled",
            }),
            (Cancelled, Transition::Confirm) => Err(InvalidTransition {
                from: self,
                transition,
                reason: "Booking is cancelled and cannot be confirmed",
            }),
            (Confirmed, Transition::Lapse) => Err(InvalidTransition {
                from: self,
                transition,
                reason: "Booking is already paid",
            }),
            (Completed, _) => Err(InvalidTransition {
                from: self,
                transition,
                reason: "Booking is already completed",
            }),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Payment settled.
    Confirm,
    /// Payment link expired or the payment failed.
    Lapse,
    /// Explicit cancellation by the guest or an admin.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Apply(BookingStatus),
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: BookingStatus,
    pub transition: Transition,
    pub reason: &'static str,
}

impl From<InvalidTransition> for BookingError {
    fn from(err: InvalidTransition) -> Self {
        BookingError::Conflict(err.reason.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i64,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub payment_reference: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Half-open stay range `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        if check_in >= check_out {
            return Err(BookingError::BadRequest(
                "Check-out must be after check-in".to_string(),
            ));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBooking {
    #[validate(length(min = 1))]
    pub room_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1))]
    pub guests: i64,
}
