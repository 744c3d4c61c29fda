use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{BookingError, Result};
use crate::models::booking::{
    Booking, BookingStatus, CreateBooking, InvalidTransition, StayDates, Step, Transition,
};
use crate::models::room::Room;
use crate::models::user::Principal;
use crate::services::availability::{self, RoomLocks};
use crate::services::catalog;
use crate::services::payment::{PaymentGateway, PaymentLink, PaymentRequest};

// Status only moves forward, so a booking can race at most twice before
// it settles in a state where every transition is decided.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

#[derive(Debug)]
pub enum TransitionOutcome {
    Applied(Booking),
    /// The booking was already where the transition leads.
    Unchanged(Booking),
    Rejected(Booking, InvalidTransition),
}

/// Owns booking creation and the status state machine.
///
/// Holds no booking state between calls: every operation reads the
/// current row before acting on it.
#[derive(Clone)]
pub struct BookingManager {
    pool: SqlitePool,
    gateway: Arc<dyn PaymentGateway>,
    room_locks: Arc<RoomLocks>,
    frontend_url: String,
}

impl BookingManager {
    pub fn new(
        pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            gateway,
            room_locks: Arc::new(RoomLocks::new()),
            frontend_url: frontend_url.into(),
        }
    }

    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.gateway.as_ref()
    }

    pub async fn create_booking(
        &self,
        principal: &Principal,
        request: CreateBooking,
    ) -> Result<Booking> {
        request
            .validate()
            .map_err(|e| BookingError::BadRequest(e.to_string()))?;

        let room = catalog::get_room(&self.pool, &request.room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Room not found".to_string()))?;

        let stay = StayDates::new(request.check_in, request.check_out)?;
        let total_amount = room.price * stay.nights() as f64;

        let booking = self
            .reserve(principal, &room, &stay, request.guests, total_amount)
            .await?;

        let payment = PaymentRequest {
            booking_id: booking.id.clone(),
            amount: total_amount,
            description: format!("Hotel booking for {} - {}", room.hotel_name, room.name),
            payer_email: principal.email.clone(),
            success_url: format!("{}/bookings/{}?status=success", self.frontend_url, booking.id),
            failure_url: format!("{}/bookings/{}?status=failed", self.frontend_url, booking.id),
        };

        match self.gateway.create_payment_request(payment).await {
            Ok(link) => self.attach_payment(&booking.id, &link).await.map_err(|err| {
                log::error!(
                    "Invoice {} ({}) was created for booking {} but could not be saved: {}",
                    link.payment_reference,
                    link.payment_url,
                    booking.id,
                    err
                );
                BookingError::Internal(format!(
                    "Payment link {} for booking {} could not be saved",
                    link.payment_reference, booking.id
                ))
            }),
            Err(err) => {
                log::error!(
                    "Failed to create payment request for booking {}: {}",
                    booking.id,
                    err
                );
                self.discard_unpaid(&booking.id).await;
                Err(err.into())
            }
        }
    }

    /// Checks availability and inserts a PENDING booking as one unit.
    async fn reserve(
        &self,
        principal: &Principal,
        room: &Room,
        stay: &StayDates,
        guests: i64,
        total_amount: f64,
    ) -> Result<Booking> {
        let _room_guard = self.room_locks.acquire(&room.id).await;
        // IMMEDIATE takes SQLite's write lock before the availability read, so
        // a writer on another pool waits here instead of failing its insert.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        if !availability::is_available(&mut *tx, &room.id, stay).await? {
            return Err(BookingError::Conflict(
                "Room is not available for selected dates".to_string(),
            ));
        }

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (id, room_id, user_id, check_in, check_out, guests, total_amount, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&room.id)
        .bind(&principal.id)
        .bind(stay.check_in())
        .bind(stay.check_out())
        .bind(guests)
        .bind(total_amount)
        .bind(BookingStatus::Pending)
        .bind(Utc::now().naive_utc())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "Reserved room {} of hotel {} from {} to {} as booking {}",
            room.id,
            room.hotel_id,
            stay.check_in(),
            stay.check_out(),
            booking.id
        );
        Ok(booking)
    }

    async fn attach_payment(&self, booking_id: &str, link: &PaymentLink) -> Result<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_reference = ?, payment_url = ? WHERE id = ? RETURNING *",
        )
        .bind(&link.payment_reference)
        .bind(&link.payment_url)
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        booking.ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))
    }

    /// Removes a booking whose payment request never went out, releasing
    /// its dates.
    async fn discard_unpaid(&self, booking_id: &str) {
        let result = sqlx::query(
            "DELETE FROM bookings WHERE id = ? AND status = 'PENDING' AND payment_reference IS NULL",
        )
        .bind(booking_id)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            log::error!("Failed to roll back booking {}: {}", booking_id, err);
        }
    }

    pub async fn cancel_booking(&self, principal: &Principal, booking_id: &str) -> Result<Booking> {
        let booking = self.get_booking(principal, booking_id).await?;

        match self.transition(booking, Transition::Cancel).await? {
            TransitionOutcome::Applied(booking) => {
                log::info!("Booking {} cancelled by {}", booking.id, principal.id);
                Ok(booking)
            }
            TransitionOutcome::Unchanged(booking) => Ok(booking),
            TransitionOutcome::Rejected(_, invalid) => Err(invalid.into()),
        }
    }

    pub async fn get_booking(&self, principal: &Principal, booking_id: &str) -> Result<Booking> {
        let booking = self
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;

        if !principal.can_access(&booking.user_id) {
            return Err(BookingError::Forbidden("Access denied".to_string()));
        }
        Ok(booking)
    }

    /// Lists bookings newest first. Without `user_id` the caller's own
    /// bookings are returned; other users' lists are admin-only.
    pub async fn list_bookings_for_user(
        &self,
        principal: &Principal,
        user_id: Option<&str>,
    ) -> Result<Vec<Booking>> {
        let user_id = user_id.unwrap_or(principal.id.as_str());
        if !principal.can_access(user_id) {
            return Err(BookingError::Forbidden("Access denied".to_string()));
        }

        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    pub async fn find_booking(&self, booking_id: &str) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    /// Applies `transition` to the persisted booking.
    ///
    /// The write is a compare-and-set on the status that was read, so two
    /// concurrent transitions on one booking cannot both apply. A lost race
    /// re-reads the row and decides again.
    pub async fn transition(
        &self,
        mut booking: Booking,
        transition: Transition,
    ) -> Result<TransitionOutcome> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let next = match booking.status.apply(transition) {
                Ok(Step::Apply(next)) => next,
                Ok(Step::Noop) => return Ok(TransitionOutcome::Unchanged(booking)),
                Err(invalid) => return Ok(TransitionOutcome::Rejected(booking, invalid)),
            };

            let updated = sqlx::query_as::<_, Booking>(
                "UPDATE bookings SET status = ? WHERE id = ? AND status = ? RETURNING *",
            )
            .bind(next)
            .bind(&booking.id)
            .bind(booking.status)
            .fetch_optional(&self.pool)
            .await?;

            match updated {
                Some(updated) => return Ok(TransitionOutcome::Applied(updated)),
                None => {
                    log::debug!("Booking {} changed underneath us, re-reading", booking.id);
                    booking = self
                        .find_booking(&booking.id)
                        .await?
                        .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
                }
            }
        }

        Err(BookingError::Conflict(format!(
            "Booking {} is being modified concurrently",
            booking.id
        )))
    }
}
