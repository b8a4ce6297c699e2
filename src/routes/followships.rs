use crate::{auth::AuthUser, db::Db, errors::ApiError};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct FollowReq {
    pub id: String,
}

pub async fn follow(
    db: web::Data<Db>,
    user: AuthUser,
    body: web::Json<FollowReq>,
) -> Result<HttpResponse, ApiError> {
    if body.id == user.user_id {
        return Err(ApiError::BadRequest("You cannot follow yourself".into()));
    }
    sqlx::query("SELECT 1 FROM users WHERE id = ?")
        .bind(&body.id)
        .fetch_optional(&db.0)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let res =
        sqlx::query("INSERT INTO followships(follower_id, following_id, created_at) VALUES (?, ?, ?)")
            .bind(&user.user_id)
            .bind(&body.id)
            .bind(Utc::now())
            .execute(&db.0)
            .await;

    match res {
        Ok(_) => Ok(HttpResponse::Ok().finish()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            ApiError::Conflict("You are already following this user".into()),
        ),
        Err(e) => Err(e.into()),
    }
}

pub async fn unfollow(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let following_id = path.into_inner();
    let res = sqlx::query("DELETE FROM followships WHERE follower_id = ? AND following_id = ?")
        .bind(&user.user_id)
        .bind(&following_id)
        .execute(&db.0)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::NotFound(
            "You are not following this user".into(),
        ));
    }
    Ok(HttpResponse::Ok().finish())
}
