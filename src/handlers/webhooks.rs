use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::error::BookingError;
use crate::services::webhook::{PaymentEvent, WebhookReconciler};

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Xendit invoice callback.
///
/// The body is parsed by hand so a bad token is answered with 401 even when
/// the payload is also malformed.
pub async fn xendit_callback(
    reconciler: web::Data<WebhookReconciler>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, BookingError> {
    let token = req
        .headers()
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let event = serde_json::from_slice::<PaymentEvent>(&body).ok();

    reconciler.handle_payment_event(token, event).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
