use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct StoredFile {
    pub id: String,
    pub user_id: String,
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}
