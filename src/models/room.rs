use serde::{Deserialize, Serialize};

/// A bookable room as the catalog exposes it for pricing.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Room {
    pub id: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub name: String,
    pub price: f64,
}
