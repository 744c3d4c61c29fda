use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;

use hotel_booking::config::Config;
use hotel_booking::db;
use hotel_booking::services::bookings::BookingManager;
use hotel_booking::services::payment::XenditClient;
use hotel_booking::services::webhook::WebhookReconciler;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger and environment
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(io::Error::other)?;

    log::info!("Connecting to database...");
    let pool = db::get_db_pool(&config.database_url)
        .await
        .map_err(io::Error::other)?;

    log::info!("Running migrations...");
    db::run_migrations(&pool).await.map_err(io::Error::other)?;

    let gateway = XenditClient::new(&config.payment).map_err(io::Error::other)?;
    let manager = BookingManager::new(pool.clone(), Arc::new(gateway), config.frontend_url.clone());
    let reconciler = WebhookReconciler::new(manager.clone());

    let manager = web::Data::new(manager);
    let reconciler = web::Data::new(reconciler);

    let frontend_url = config.frontend_url.clone();

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    // actix stops accepting on SIGINT/SIGTERM and drains in-flight requests
    HttpServer::new(move || {
        App::new()
            .app_data(manager.clone())
            .app_data(reconciler.clone())
            .wrap(hotel_booking::cors(&frontend_url))
            .wrap(middleware::Logger::default())
            .configure(hotel_booking::routes)
    })
    .bind((config.host.as_str(), config.port))?
    .shutdown_timeout(30)
    .run()
    .await?;

    log::info!("Shutting down, closing database pool");
    pool.close().await;
    Ok(())
}
