use serde::Deserialize;

use crate::error::{BookingError, Result};
use crate::models::booking::{BookingStatus, Transition};
use crate::services::bookings::{BookingManager, TransitionOutcome};

/// Invoice callback body. The provider sends many more fields; only these
/// two drive reconciliation.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentEvent {
    pub external_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied {
        booking_id: String,
        status: BookingStatus,
    },
    AlreadyApplied {
        booking_id: String,
        status: BookingStatus,
    },
    Ignored {
        reason: String,
    },
}

/// Maps a provider invoice status to the transition it drives.
pub fn transition_for(status: &str) -> Option<Transition> {
    match status {
        "PAID" => Some(Transition::Confirm),
        "EXPIRED" | "FAILED" => Some(Transition::Lapse),
        _ => None,
    }
}

#[derive(Clone)]
pub struct WebhookReconciler {
    manager: BookingManager,
}

impl WebhookReconciler {
    pub fn new(manager: BookingManager) -> Self {
        Self { manager }
    }

    /// Applies one payment notification.
    ///
    /// Redeliveries and statuses that no longer apply are accepted without
    /// error so provider retries settle on the same state.
    pub async fn handle_payment_event(
        &self,
        token: Option<&str>,
        event: Option<PaymentEvent>,
    ) -> Result<WebhookOutcome> {
        let authentic = token
            .map(|t| self.manager.gateway().verify_webhook_authenticity(t))
            .unwrap_or(false);
        if !authentic {
            log::warn!("Rejected payment webhook with invalid token");
            return Err(BookingError::Unauthorized(
                "Invalid webhook token".to_string(),
            ));
        }

        let event = event.unwrap_or_default();
        let (external_id, status) = match (non_empty(event.external_id), non_empty(event.status)) {
            (Some(external_id), Some(status)) => (external_id, status),
            _ => {
                return Err(BookingError::BadRequest(
                    "Invalid webhook body".to_string(),
                ))
            }
        };

        let transition = match transition_for(&status) {
            Some(transition) => transition,
            None => {
                log::info!(
                    "Ignoring webhook status {} for booking {}",
                    status,
                    external_id
                );
                return Ok(WebhookOutcome::Ignored {
                    reason: format!("unhandled status {}", status),
                });
            }
        };

        let booking = self
            .manager
            .find_booking(&external_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;

        match self.manager.transition(booking, transition).await? {
            TransitionOutcome::Applied(booking) => {
                log::info!(
                    "Booking {} is now {} after payment status {}",
                    booking.id,
                    booking.status,
                    status
                );
                Ok(WebhookOutcome::Applied {
                    booking_id: booking.id,
                    status: booking.status,
                })
            }
            TransitionOutcome::Unchanged(booking) => {
                log::info!(
                    "Duplicate payment status {} for booking {} ({})",
                    status,
                    booking.id,
                    booking.status
                );
                Ok(WebhookOutcome::AlreadyApplied {
                    booking_id: booking.id,
                    status: booking.status,
                })
            }
            TransitionOutcome::Rejected(booking, invalid) => {
                log::warn!(
                    "Ignoring payment status {} for booking {}: {}",
                    status,
                    booking.id,
                    invalid.reason
                );
                Ok(WebhookOutcome::Ignored {
                    reason: invalid.reason.to_string(),
                })
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_statuses_map_to_transitions() {
        assert_eq!(transition_for("PAID"), Some(Transition::Confirm));
        assert_eq!(transition_for("EXPIRED"), Some(Transition::Lapse));
        assert_eq!(transition_for("FAILED"), Some(Transition::Lapse));
        assert_eq!(transition_for("PENDING"), None);
        assert_eq!(transition_for("paid"), None);
    }

    #[test]
    fn event_ignores_extra_fields() {
        let event: PaymentEvent = serde_json::from_str(
            r#"{"id":"inv_1","external_id":"b-1","status":"PAID","amount":300}"#,
        )
        .unwrap();
        assert_eq!(event.external_id.as_deref(), Some("b-1"));
        assert_eq!(event.status.as_deref(), Some("PAID"));
    }
}
