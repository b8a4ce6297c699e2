use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Reply {
    pub id: String,
    pub tweet_id: String,
    pub user_id: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
