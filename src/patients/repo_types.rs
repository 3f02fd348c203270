use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Patient record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub email: String, // trimmed + lowercased, unique
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    pub data: serde_json::Value, // latest forms submission, `{}` until the first one
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
