use sqlx::SqlitePool;

use crate::models::room::Room;

pub async fn get_room(pool: &SqlitePool, room_id: &str) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(
        r#"
        SELECT r.id, r.hotel_id, h.name AS hotel_name, r.name, r.price
        FROM rooms r
        JOIN hotels h ON h.id = r.hotel_id
        WHERE r.id = ?
        "#,
    )
    .bind(room_id)
    .fetch_optional(pool)
    .await
}
