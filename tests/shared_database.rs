mod common;

use std::sync::Arc;

use chrono::Duration;

use common::{date, seed_room, user, FakeGateway, FRONTEND_URL, ROOM_ID};
use hotel_booking::db;
use hotel_booking::error::BookingError;
use hotel_booking::models::booking::CreateBooking;
use hotel_booking::services::bookings::BookingManager;

fn nights_from(offset: i64, check_in: i64, check_out: i64) -> CreateBooking {
    let base = date("2024-07-01") + Duration::days(offset);
    CreateBooking {
        room_id: ROOM_ID.to_string(),
        check_in: base + Duration::days(check_in),
        check_out: base + Duration::days(check_out),
        guests: 2,
    }
}

/// Two managers with their own pools and room locks over one database file,
/// as two server processes would run.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn separate_pools_racing_for_a_room_admit_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("bookings.db").display());

    let first_pool = db::get_db_pool(&url).await.unwrap();
    db::run_migrations(&first_pool).await.unwrap();
    seed_room(&first_pool, ROOM_ID, 100.0).await;
    let second_pool = db::get_db_pool(&url).await.unwrap();

    let first = BookingManager::new(
        first_pool.clone(),
        Arc::new(FakeGateway::default()),
        FRONTEND_URL,
    );
    let second = BookingManager::new(
        second_pool.clone(),
        Arc::new(FakeGateway::default()),
        FRONTEND_URL,
    );
    let alice = user("alice");
    let bob = user("bob");

    for round in 0..20 {
        let offset = round * 10;
        let (a, b) = tokio::join!(
            first.create_booking(&alice, nights_from(offset, 0, 3)),
            second.create_booking(&bob, nights_from(offset, 1, 4)),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        let conflicts = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(BookingError::Conflict(_))))
            .count();
        assert_eq!(successes, 1, "round {}: {:?} / {:?}", round, a, b);
        assert_eq!(conflicts, 1, "round {}: {:?} / {:?}", round, a, b);
    }

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE status IN ('PENDING', 'CONFIRMED')",
    )
    .fetch_one(&second_pool)
    .await
    .unwrap();
    assert_eq!(active, 20);

    first_pool.close().await;
    second_pool.close().await;
}
