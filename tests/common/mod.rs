#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use hotel_booking::db;
use hotel_booking::models::booking::CreateBooking;
use hotel_booking::models::user::{Principal, Role};
use hotel_booking::services::bookings::BookingManager;
use hotel_booking::services::payment::{PaymentError, PaymentGateway, PaymentLink, PaymentRequest};
use hotel_booking::services::webhook::WebhookReconciler;

pub const WEBHOOK_TOKEN: &str = "test-callback-token";
pub const FRONTEND_URL: &str = "http://localhost:5173";
pub const ROOM_ID: &str = "room-deluxe";

/// Records every payment request and answers with a deterministic link.
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<PaymentRequest>>,
    failing: AtomicBool,
}

impl FakeGateway {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_request(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentLink, PaymentError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentError::Rejected {
                status: 503,
                body: "provider unavailable".to_string(),
            });
        }

        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(PaymentLink {
            payment_url: format!("https://checkout.test/invoices/{}", request.booking_id),
            payment_reference: format!("inv_{}", requests.len()),
        })
    }

    fn verify_webhook_authenticity(&self, presented_token: &str) -> bool {
        presented_token == WEBHOOK_TOKEN
    }
}

pub struct TestContext {
    pub pool: SqlitePool,
    pub gateway: Arc<FakeGateway>,
    pub manager: BookingManager,
    pub reconciler: WebhookReconciler,
}

/// A single-connection in-memory database; every pooled connection to
/// `sqlite::memory:` would otherwise be its own empty database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

pub async fn seed_room(pool: &SqlitePool, room_id: &str, price: f64) {
    sqlx::query("INSERT OR IGNORE INTO hotels (id, name, city) VALUES ('hotel-1', 'Grand Hyatt', 'Jakarta')")
        .execute(pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO rooms (id, hotel_id, name, price, capacity) VALUES (?, 'hotel-1', 'Deluxe', ?, 2)")
        .bind(room_id)
        .bind(price)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn setup() -> TestContext {
    let pool = test_pool().await;
    seed_room(&pool, ROOM_ID, 100.0).await;

    let gateway = Arc::new(FakeGateway::default());
    let manager = BookingManager::new(pool.clone(), gateway.clone(), FRONTEND_URL);
    let reconciler = WebhookReconciler::new(manager.clone());

    TestContext {
        pool,
        gateway,
        manager,
        reconciler,
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn user(id: &str) -> Principal {
    Principal {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        role: Role::User,
    }
}

pub fn admin(id: &str) -> Principal {
    Principal {
        role: Role::Admin,
        ..user(id)
    }
}

pub fn stay(room_id: &str, check_in: &str, check_out: &str) -> CreateBooking {
    CreateBooking {
        room_id: room_id.to_string(),
        check_in: date(check_in),
        check_out: date(check_out),
        guests: 2,
    }
}
