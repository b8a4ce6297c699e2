use crate::{
    auth::AuthUser,
    config::Config,
    db::Db,
    errors::ApiError,
    models::user::{User, UserData, UserSummary},
    permissions::require_owner,
    routes::files::{self, SavedFile},
    routes::tweets::{tweet_item, TweetItem, TWEET_ITEM_SELECT},
};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt as _;
use serde::{Deserialize, Serialize};
use sqlx::Row;

const USER_COLUMNS: &str =
    "id, account, name, email, password_hash, introduction, avatar, cover_image, role, created_at, updated_at";

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    if name.chars().count() > 50 {
        return Err(ApiError::BadRequest(
            "Name is longer than 50 characters".into(),
        ));
    }
    Ok(())
}

fn validate_introduction(introduction: &str) -> Result<(), ApiError> {
    if introduction.chars().count() > 160 {
        return Err(ApiError::BadRequest(
            "Introduction is longer than 160 characters".into(),
        ));
    }
    Ok(())
}

async fn fetch_user(db: &Db, user_id: &str) -> Result<User, ApiError> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(&db.0)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

async fn fetch_followers(db: &Db, user_id: &str) -> Result<Vec<UserSummary>, ApiError> {
    Ok(sqlx::query_as::<_, UserSummary>(
        "SELECT u.id, u.account, u.avatar, u.name \
         FROM followships f \
         INNER JOIN users u ON u.id = f.follower_id \
         WHERE f.following_id = ? \
         ORDER BY f.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&db.0)
    .await?)
}

async fn fetch_followings(db: &Db, user_id: &str) -> Result<Vec<UserSummary>, ApiError> {
    Ok(sqlx::query_as::<_, UserSummary>(
        "SELECT u.id, u.account, u.avatar, u.name \
         FROM followships f \
         INNER JOIN users u ON u.id = f.following_id \
         WHERE f.follower_id = ? \
         ORDER BY f.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&db.0)
    .await?)
}

#[derive(Serialize)]
struct Profile {
    #[serde(flatten)]
    user: UserData,
    followers: Vec<UserSummary>,
    followings: Vec<UserSummary>,
    tweet_count: i64,
    follower_count: i64,
    following_count: i64,
}

pub async fn get_user(
    db: web::Data<Db>,
    _user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let user = fetch_user(&db, &user_id).await?;

    let followers = fetch_followers(&db, &user_id).await?;
    let followings = fetch_followings(&db, &user_id).await?;
    let tweet_count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM tweets WHERE user_id = ?")
        .bind(&user_id)
        .fetch_one(&db.0)
        .await?
        .get("n");

    let follower_count = followers.len() as i64;
    let following_count = followings.len() as i64;
    Ok(HttpResponse::Ok().json(Profile {
        user: user.into(),
        followers,
        followings,
        tweet_count,
        follower_count,
        following_count,
    }))
}

#[derive(Deserialize)]
pub struct UpdateAccountReq {
    pub account: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub check_password: String,
}

pub async fn update_account(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateAccountReq>,
) -> Result<HttpResponse, ApiError> {
    let target_id = path.into_inner();
    let target = fetch_user(&db, &target_id).await?;
    require_owner(&user, &target.id)?;

    if body.account.trim().is_empty()
        || body.name.trim().is_empty()
        || body.email.trim().is_empty()
    {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    if body.account != target.account {
        if sqlx::query("SELECT 1 FROM users WHERE account = ?")
            .bind(&body.account)
            .fetch_optional(&db.0)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict("This account already exists".into()));
        }
    }
    if body.email != target.email {
        if sqlx::query("SELECT 1 FROM users WHERE email = ?")
            .bind(&body.email)
            .fetch_optional(&db.0)
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict("This email already exists".into()));
        }
    }

    if body.name.chars().count() > 50 {
        return Err(ApiError::BadRequest(
            "Name is longer than 50 characters".into(),
        ));
    }

    // Password is optional on this form. A blank or whitespace-only value
    // keeps the stored hash; anything else must match the confirmation and
    // gets rehashed, so a raw password can never land in the table.
    let new_hash = if body.password.trim().is_empty() {
        None
    } else {
        if body.password != body.check_password {
            return Err(ApiError::BadRequest("Passwords do not match".into()));
        }
        Some(crate::auth::hash_password(&body.password)?)
    };

    sqlx::query(
        "UPDATE users SET account = ?, name = ?, email = ?, password_hash = COALESCE(?, password_hash), updated_at = ? WHERE id = ?",
    )
    .bind(&body.account)
    .bind(&body.name)
    .bind(&body.email)
    .bind(&new_hash)
    .bind(Utc::now())
    .bind(&target.id)
    .execute(&db.0)
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "User is updated successfully",
        "user_updated": {
            "account": body.account,
            "name": body.name,
            "email": body.email,
        },
    })))
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String, ApiError> {
    let mut data: Vec<u8> = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("invalid multipart".into()))?
    {
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data).map_err(|_| ApiError::BadRequest("invalid multipart".into()))
}

pub async fn update_profile(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let target_id = path.into_inner();
    require_owner(&user, &target_id)?;
    let target = fetch_user(&db, &target_id).await?;

    let mut name: Option<String> = None;
    let mut introduction: Option<String> = None;
    let mut avatar: Option<SavedFile> = None;
    let mut cover_image: Option<SavedFile> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("invalid multipart".into()))?
    {
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|s| s.to_string()))
            .unwrap_or_default();
        match field_name.as_str() {
            "name" => name = Some(read_text_field(&mut field).await?),
            "introduction" => introduction = Some(read_text_field(&mut field).await?),
            "avatar" => {
                avatar = Some(files::save_multipart_file(&cfg, &db, &user.user_id, field).await?)
            }
            "cover_image" => {
                cover_image =
                    Some(files::save_multipart_file(&cfg, &db, &user.user_id, field).await?)
            }
            _ => {
                // drain unknown parts so the stream can advance
                read_text_field(&mut field).await.ok();
            }
        }
    }

    let name = name.unwrap_or_default();
    let introduction = introduction.unwrap_or_default();
    validate_name(&name)?;
    validate_introduction(&introduction)?;

    let avatar_url = avatar
        .map(|f| files::file_url(&f.file_id, &f.original_name))
        .or(target.avatar);
    let cover_url = cover_image
        .map(|f| files::file_url(&f.file_id, &f.original_name))
        .or(target.cover_image);

    sqlx::query(
        "UPDATE users SET name = ?, introduction = ?, avatar = ?, cover_image = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&introduction)
    .bind(&avatar_url)
    .bind(&cover_url)
    .bind(Utc::now())
    .bind(&target.id)
    .execute(&db.0)
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "User Profile is updated successfully",
        "user_updated": {
            "name": name,
            "introduction": introduction,
            "avatar": avatar_url,
            "cover_image": cover_url,
        },
    })))
}

pub async fn get_user_tweets(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    fetch_user(&db, &user_id).await?;

    // A user with no tweets is an empty listing, not an error.
    let sql = format!(
        "{} WHERE t.user_id = ? ORDER BY t.created_at DESC",
        TWEET_ITEM_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(&user.user_id)
        .bind(&user_id)
        .fetch_all(&db.0)
        .await?;
    let tweets: Vec<TweetItem> = rows.iter().map(tweet_item).collect();
    Ok(HttpResponse::Ok().json(tweets))
}

pub async fn get_user_replied_tweets(
    db: web::Data<Db>,
    _user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    fetch_user(&db, &user_id).await?;

    let rows = sqlx::query(
        "SELECT rp.id, rp.comment, rp.created_at, \
                t.id AS tweet_id, t.description AS tweet_description, t.created_at AS tweet_created_at, \
                tu.id AS tweet_user_id, tu.account AS tweet_user_account, tu.avatar AS tweet_user_avatar \
         FROM replies rp \
         INNER JOIN tweets t ON t.id = rp.tweet_id \
         INNER JOIN users tu ON tu.id = t.user_id \
         WHERE rp.user_id = ? \
         ORDER BY rp.created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&db.0)
    .await?;

    let replies: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            serde_json::json!({
                "id": r.get::<String, _>("id"),
                "comment": r.get::<String, _>("comment"),
                "created_at": r.get::<DateTime<Utc>, _>("created_at"),
                "tweet": {
                    "id": r.get::<String, _>("tweet_id"),
                    "description": r.get::<String, _>("tweet_description"),
                    "created_at": r.get::<DateTime<Utc>, _>("tweet_created_at"),
                    "user": {
                        "id": r.get::<String, _>("tweet_user_id"),
                        "account": r.get::<String, _>("tweet_user_account"),
                        "avatar": r.get::<Option<String>, _>("tweet_user_avatar"),
                    },
                },
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(replies))
}

pub async fn get_user_likes(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    fetch_user(&db, &user_id).await?;

    let sql = format!(
        "{} INNER JOIN likes lk ON lk.tweet_id = t.id WHERE lk.user_id = ? ORDER BY lk.created_at DESC",
        TWEET_ITEM_SELECT
    );
    let rows = sqlx::query(&sql)
        .bind(&user.user_id)
        .bind(&user_id)
        .fetch_all(&db.0)
        .await?;
    let tweets: Vec<TweetItem> = rows.iter().map(tweet_item).collect();
    Ok(HttpResponse::Ok().json(tweets))
}

pub async fn get_followers(
    db: web::Data<Db>,
    _user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    fetch_user(&db, &user_id).await?;
    let followers = fetch_followers(&db, &user_id).await?;
    Ok(HttpResponse::Ok().json(followers))
}

pub async fn get_followings(
    db: web::Data<Db>,
    _user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    fetch_user(&db, &user_id).await?;
    let followings = fetch_followings(&db, &user_id).await?;
    Ok(HttpResponse::Ok().json(followings))
}
