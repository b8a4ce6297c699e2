use crate::{
    auth,
    config::Config,
    db::Db,
    errors::ApiError,
    models::user::{User, UserData},
};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct RegisterReq {
    pub account: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub check_password: String,
}

pub async fn register(
    db: web::Data<Db>,
    body: web::Json<RegisterReq>,
) -> Result<HttpResponse, ApiError> {
    if body.account.trim().is_empty()
        || body.name.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.trim().is_empty()
        || body.check_password.trim().is_empty()
    {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }
    if body.password != body.check_password {
        return Err(ApiError::BadRequest("Passwords do not match".into()));
    }
    if body.name.chars().count() > 50 {
        return Err(ApiError::BadRequest(
            "Name is longer than 50 characters".into(),
        ));
    }

    // Distinct messages per column; the UNIQUE constraints are the backstop
    // for concurrent duplicate registration.
    if sqlx::query("SELECT 1 FROM users WHERE account = ?")
        .bind(&body.account)
        .fetch_optional(&db.0)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("This account already exists".into()));
    }
    if sqlx::query("SELECT 1 FROM users WHERE email = ?")
        .bind(&body.email)
        .fetch_optional(&db.0)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("This email already exists".into()));
    }

    let hash = auth::hash_password(&body.password)?;
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now();

    let res = sqlx::query(
        "INSERT INTO users(id, account, name, email, password_hash, introduction, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, '', 'user', ?, ?)",
    )
    .bind(&id)
    .bind(&body.account)
    .bind(&body.name)
    .bind(&body.email)
    .bind(&hash)
    .bind(now)
    .bind(now)
    .execute(&db.0)
    .await;

    match res {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "User is registered successfully"
        }))),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let msg = if db_err.message().contains("account") {
                "This account already exists"
            } else {
                "This email already exists"
            };
            Err(ApiError::Conflict(msg.into()))
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Deserialize)]
pub struct SigninReq {
    pub account: String,
    pub password: String,
}

#[derive(Serialize)]
struct SigninData {
    token: String,
    user: UserData,
}

#[derive(Serialize)]
struct SigninResp {
    status: &'static str,
    data: SigninData,
}

pub async fn signin(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    body: web::Json<SigninReq>,
) -> Result<HttpResponse, ApiError> {
    signin_as(&cfg, &db, &body, "user").await
}

pub async fn admin_signin(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    body: web::Json<SigninReq>,
) -> Result<HttpResponse, ApiError> {
    signin_as(&cfg, &db, &body, "admin").await
}

async fn signin_as(
    cfg: &Config,
    db: &Db,
    body: &SigninReq,
    required_role: &str,
) -> Result<HttpResponse, ApiError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, account, name, email, password_hash, introduction, avatar, cover_image, role, created_at, updated_at FROM users WHERE account = ?",
    )
    .bind(&body.account)
    .fetch_optional(&db.0)
    .await?
    .ok_or(ApiError::Unauthorized)?;

    if !auth::verify_password(&user.password_hash, &body.password) {
        return Err(ApiError::Unauthorized);
    }
    if user.role != required_role {
        return Err(ApiError::Forbidden("permission denied".into()));
    }

    let token = auth::create_token(&user, cfg)?;
    Ok(HttpResponse::Ok().json(SigninResp {
        status: "success",
        data: SigninData {
            token,
            user: user.into(),
        },
    }))
}
