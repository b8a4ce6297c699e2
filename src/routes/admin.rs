use crate::{auth::AuthUser, db::Db, errors::ApiError, permissions::require_admin};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Serialize, FromRow)]
struct AdminUserItem {
    id: String,
    account: String,
    name: String,
    email: String,
    avatar: Option<String>,
    cover_image: Option<String>,
    role: String,
    tweet_count: i64,
    like_count: i64,
    follower_count: i64,
    following_count: i64,
}

pub async fn list_users(db: web::Data<Db>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    require_admin(&db, &user.user_id).await?;

    let users = sqlx::query_as::<_, AdminUserItem>(
        "SELECT u.id, u.account, u.name, u.email, u.avatar, u.cover_image, u.role, \
                (SELECT COUNT(*) FROM tweets t WHERE t.user_id = u.id) AS tweet_count, \
                (SELECT COUNT(*) FROM likes l INNER JOIN tweets t ON t.id = l.tweet_id WHERE t.user_id = u.id) AS like_count, \
                (SELECT COUNT(*) FROM followships f WHERE f.following_id = u.id) AS follower_count, \
                (SELECT COUNT(*) FROM followships f WHERE f.follower_id = u.id) AS following_count \
         FROM users u \
         ORDER BY tweet_count DESC, u.account ASC",
    )
    .fetch_all(&db.0)
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

pub async fn delete_tweet(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&db, &user.user_id).await?;
    let tweet_id = path.into_inner();

    sqlx::query("SELECT 1 FROM tweets WHERE id = ?")
        .bind(&tweet_id)
        .fetch_optional(&db.0)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".into()))?;

    let mut tx = db.0.begin().await?;
    sqlx::query("DELETE FROM likes WHERE tweet_id = ?")
        .bind(&tweet_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM replies WHERE tweet_id = ?")
        .bind(&tweet_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tweets WHERE id = ?")
        .bind(&tweet_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!(
        "AdminAction: delete_tweet admin_id={} tweet_id={}",
        user.user_id,
        tweet_id
    );
    Ok(HttpResponse::Ok().finish())
}
