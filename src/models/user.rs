use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub account: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub introduction: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing user record. The password hash stays in `User` and is never
/// serialized.
#[derive(Debug, Clone, Serialize)]
pub struct UserData {
    pub id: String,
    pub account: String,
    pub name: String,
    pub email: String,
    pub introduction: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserData {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            account: u.account,
            name: u.name,
            email: u.email,
            introduction: u.introduction,
            avatar: u.avatar,
            cover_image: u.cover_image,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Short form used in follower lists and as tweet/reply author.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: String,
    pub account: String,
    pub avatar: Option<String>,
    pub name: String,
}
