use crate::{
    auth::AuthUser,
    db::Db,
    errors::ApiError,
    models::{reply::Reply, tweet::Tweet, user::UserSummary},
};
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[derive(Serialize)]
pub struct TweetItem {
    pub id: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub replies_count: i64,
    pub likes_count: i64,
    pub is_liked: bool,
    pub user: UserSummary,
}

// Shared projection for tweet listings: author summary, reply/like counts and
// the viewer's like state. The first bind is always the viewer id.
pub(crate) const TWEET_ITEM_SELECT: &str = "\
SELECT t.id, t.description, t.created_at, t.updated_at, \
       u.id AS author_id, u.account AS author_account, u.avatar AS author_avatar, u.name AS author_name, \
       (SELECT COUNT(*) FROM replies r WHERE r.tweet_id = t.id) AS replies_count, \
       (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS likes_count, \
       EXISTS (SELECT 1 FROM likes l WHERE l.tweet_id = t.id AND l.user_id = ?) AS is_liked \
FROM tweets t \
INNER JOIN users u ON u.id = t.user_id";

pub(crate) fn tweet_item(row: &SqliteRow) -> TweetItem {
    TweetItem {
        id: row.get("id"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        replies_count: row.get("replies_count"),
        likes_count: row.get("likes_count"),
        is_liked: row.get::<i64, _>("is_liked") != 0,
        user: UserSummary {
            id: row.get("author_id"),
            account: row.get("author_account"),
            avatar: row.get("author_avatar"),
            name: row.get("author_name"),
        },
    }
}

async fn ensure_tweet_exists(db: &Db, tweet_id: &str) -> Result<(), ApiError> {
    sqlx::query("SELECT 1 FROM tweets WHERE id = ?")
        .bind(tweet_id)
        .fetch_optional(&db.0)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Tweet not found".into()))
}

pub async fn list_tweets(db: web::Data<Db>, user: AuthUser) -> Result<HttpResponse, ApiError> {
    let sql = format!("{} ORDER BY t.created_at DESC", TWEET_ITEM_SELECT);
    let rows = sqlx::query(&sql)
        .bind(&user.user_id)
        .fetch_all(&db.0)
        .await?;
    let tweets: Vec<TweetItem> = rows.iter().map(tweet_item).collect();
    Ok(HttpResponse::Ok().json(tweets))
}

#[derive(Deserialize)]
pub struct CreateTweetReq {
    pub description: String,
}

pub async fn create_tweet(
    db: web::Data<Db>,
    user: AuthUser,
    body: web::Json<CreateTweetReq>,
) -> Result<HttpResponse, ApiError> {
    if body.description.trim().is_empty() {
        return Err(ApiError::BadRequest("Description is required".into()));
    }
    if body.description.chars().count() > 140 {
        return Err(ApiError::BadRequest(
            "Description is longer than 140 characters".into(),
        ));
    }

    let now = Utc::now();
    let tweet = Tweet {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        description: body.description.clone(),
        created_at: now,
        updated_at: now,
    };
    sqlx::query(
        "INSERT INTO tweets(id, user_id, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&tweet.id)
    .bind(&tweet.user_id)
    .bind(&tweet.description)
    .bind(tweet.created_at)
    .bind(tweet.updated_at)
    .execute(&db.0)
    .await?;

    Ok(HttpResponse::Ok().json(tweet))
}

pub async fn get_tweet(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tweet_id = path.into_inner();
    let sql = format!("{} WHERE t.id = ?", TWEET_ITEM_SELECT);
    let row = sqlx::query(&sql)
        .bind(&user.user_id)
        .bind(&tweet_id)
        .fetch_optional(&db.0)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".into()))?;
    Ok(HttpResponse::Ok().json(tweet_item(&row)))
}

pub async fn list_replies(
    db: web::Data<Db>,
    _user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tweet_id = path.into_inner();
    ensure_tweet_exists(&db, &tweet_id).await?;

    let rows = sqlx::query(
        "SELECT rp.id, rp.tweet_id, rp.comment, rp.created_at, \
                u.id AS user_id, u.account, u.avatar, u.name \
         FROM replies rp \
         INNER JOIN users u ON u.id = rp.user_id \
         WHERE rp.tweet_id = ? \
         ORDER BY rp.created_at ASC",
    )
    .bind(&tweet_id)
    .fetch_all(&db.0)
    .await?;

    let replies: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "id": r.get::<String, _>("id"),
                "tweet_id": r.get::<String, _>("tweet_id"),
                "comment": r.get::<String, _>("comment"),
                "created_at": r.get::<DateTime<Utc>, _>("created_at"),
                "user": {
                    "id": r.get::<String, _>("user_id"),
                    "account": r.get::<String, _>("account"),
                    "avatar": r.get::<Option<String>, _>("avatar"),
                    "name": r.get::<String, _>("name"),
                },
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(replies))
}

#[derive(Deserialize)]
pub struct CreateReplyReq {
    pub comment: String,
}

pub async fn create_reply(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<CreateReplyReq>,
) -> Result<HttpResponse, ApiError> {
    let tweet_id = path.into_inner();
    if body.comment.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment is required".into()));
    }
    ensure_tweet_exists(&db, &tweet_id).await?;

    let reply = Reply {
        id: uuid::Uuid::new_v4().to_string(),
        tweet_id,
        user_id: user.user_id.clone(),
        comment: body.comment.clone(),
        created_at: Utc::now(),
    };
    sqlx::query(
        "INSERT INTO replies(id, tweet_id, user_id, comment, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&reply.id)
    .bind(&reply.tweet_id)
    .bind(&reply.user_id)
    .bind(&reply.comment)
    .bind(reply.created_at)
    .execute(&db.0)
    .await?;

    Ok(HttpResponse::Ok().json(reply))
}

pub async fn like_tweet(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tweet_id = path.into_inner();
    ensure_tweet_exists(&db, &tweet_id).await?;

    let res = sqlx::query("INSERT INTO likes(user_id, tweet_id, created_at) VALUES (?, ?, ?)")
        .bind(&user.user_id)
        .bind(&tweet_id)
        .bind(Utc::now())
        .execute(&db.0)
        .await;

    match res {
        Ok(_) => Ok(HttpResponse::Ok().finish()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(ApiError::Conflict("You have liked this tweet".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn unlike_tweet(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tweet_id = path.into_inner();
    ensure_tweet_exists(&db, &tweet_id).await?;

    let res = sqlx::query("DELETE FROM likes WHERE user_id = ? AND tweet_id = ?")
        .bind(&user.user_id)
        .bind(&tweet_id)
        .execute(&db.0)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound("You have not liked this tweet".into()));
    }
    Ok(HttpResponse::Ok().finish())
}
