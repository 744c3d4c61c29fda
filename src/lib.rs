use actix_cors::Cors;
use actix_web::web;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use error::BookingError;

/// Lets the booking frontend call the API from the browser.
pub fn cors(frontend_url: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_url)
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Registers every route. Expects `web::Data<BookingManager>` and
/// `web::Data<WebhookReconciler>` on the app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| BookingError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| BookingError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(handlers::health::health))
    .route(
        "/webhook/xendit",
        web::post().to(handlers::webhooks::xendit_callback),
    )
    .service(
        web::scope("/bookings")
            .route("", web::post().to(handlers::bookings::create_booking))
            .route("", web::get().to(handlers::bookings::list_bookings))
            .route("/{id}", web::get().to(handlers::bookings::get_booking))
            .route(
                "/{id}",
                web::delete().to(handlers::bookings::cancel_booking),
            ),
    );
}
