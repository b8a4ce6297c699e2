use crate::{auth::AuthUser, db::Db, errors::ApiError};

pub async fn require_admin(db: &Db, user_id: &str) -> Result<(), ApiError> {
    let row = sqlx::query("SELECT 1 FROM users WHERE id = ? AND role = 'admin'")
        .bind(user_id)
        .fetch_optional(&db.0)
        .await?;

    if row.is_some() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("permission denied".into()))
    }
}

pub fn require_owner(user: &AuthUser, target_id: &str) -> Result<(), ApiError> {
    if user.user_id == target_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You are not authorized to edit this user".into(),
        ))
    }
}
