use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sqlx::{Executor, Sqlite};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::booking::StayDates;

/// Counts active bookings on `room_id` whose stay overlaps `stay`.
pub async fn count_overlapping<'e, E>(
    executor: E,
    room_id: &str,
    stay: &StayDates,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM bookings
        WHERE room_id = ?
        AND status IN ('PENDING', 'CONFIRMED')
        AND check_in < ?
        AND check_out > ?
        "#,
    )
    .bind(room_id)
    .bind(stay.check_out())
    .bind(stay.check_in())
    .fetch_one(executor)
    .await
}

/// A room is available when no active booking overlaps the stay.
///
/// On its own this is only a snapshot. Callers that insert afterwards must
/// hold the room's [`RoomLocks`] guard and run both inside one transaction.
pub async fn is_available<'e, E>(
    executor: E,
    room_id: &str,
    stay: &StayDates,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(count_overlapping(executor, room_id, stay).await? == 0)
}

/// One async mutex per room, created lazily on first use.
///
/// Serializes check-and-insert for a room within this process so waiting
/// requests queue on the room rather than on SQLite's write lock. Writers on
/// other pools are ordered by `BEGIN IMMEDIATE`; the `bookings_no_overlap`
/// trigger rejects any overlapping insert that slips past both.
#[derive(Default)]
pub struct RoomLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, room_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks
                .entry(room_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_room_is_serialized() {
        let locks = Arc::new(RoomLocks::new());
        let first = locks.acquire("room-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("room-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_rooms_do_not_block() {
        let locks = RoomLocks::new();
        let _a = locks.acquire("room-1").await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("room-2")).await;
        assert!(b.is_ok());
    }
}
