#![allow(dead_code)]

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::web::Data;
use actix_web::{test as actix_test, App, Error};
use chirp::config::Config;
use chirp::db::Db;
use chirp::routes;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

pub async fn test_db() -> Db {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Db(pool)
}

pub fn test_config() -> Config {
    let uploads = std::env::temp_dir().join(format!("chirp-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&uploads).unwrap();
    Config {
        jwt_secret: Some("test-secret".to_string()),
        uploads_dir: uploads.to_string_lossy().into_owned(),
        ..Config::default()
    }
}

pub async fn spawn_app(
    db: Db,
    cfg: Config,
) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    actix_test::init_service(
        App::new()
            .app_data(Data::new(cfg))
            .app_data(Data::new(db))
            .configure(routes::configure),
    )
    .await
}

pub async fn read_json(resp: ServiceResponse) -> Value {
    let body = actix_test::read_body(resp).await;
    serde_json::from_slice(&body).expect("response JSON")
}

pub async fn register_user(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    account: &str,
    email: &str,
    password: &str,
) {
    let req = actix_test::TestRequest::post()
        .uri("/api/users")
        .set_json(serde_json::json!({
            "account": account,
            "name": account,
            "email": email,
            "password": password,
            "check_password": password,
        }))
        .to_request();
    let resp = actix_test::call_service(app, req).await;
    assert!(resp.status().is_success(), "registration failed");
}

pub async fn signin_token(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    account: &str,
    password: &str,
) -> String {
    let req = actix_test::TestRequest::post()
        .uri("/api/users/signin")
        .set_json(serde_json::json!({"account": account, "password": password}))
        .to_request();
    let resp = actix_test::call_service(app, req).await;
    assert!(resp.status().is_success(), "signin failed");
    let json = read_json(resp).await;
    json["data"]["token"].as_str().expect("token").to_string()
}

pub async fn admin_signin_token(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    account: &str,
    password: &str,
) -> String {
    let req = actix_test::TestRequest::post()
        .uri("/api/admin/signin")
        .set_json(serde_json::json!({"account": account, "password": password}))
        .to_request();
    let resp = actix_test::call_service(app, req).await;
    assert!(resp.status().is_success(), "admin signin failed");
    let json = read_json(resp).await;
    json["data"]["token"].as_str().expect("token").to_string()
}

/// Inserts an admin account directly; registration only ever creates plain
/// users.
pub async fn seed_admin(db: &Db, account: &str, password: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let hash = chirp::auth::hash_password(password).unwrap();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO users(id, account, name, email, password_hash, introduction, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, '', 'admin', ?, ?)",
    )
    .bind(&id)
    .bind(account)
    .bind(account)
    .bind(format!("{}@example.com", account))
    .bind(&hash)
    .bind(now)
    .bind(now)
    .execute(&db.0)
    .await
    .unwrap();
    id
}

pub async fn user_id_by_account(db: &Db, account: &str) -> String {
    sqlx::query_scalar("SELECT id FROM users WHERE account = ?")
        .bind(account)
        .fetch_one(&db.0)
        .await
        .unwrap()
}

pub async fn seed_tweet(
    db: &Db,
    user_id: &str,
    description: &str,
    created_at: DateTime<Utc>,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO tweets(id, user_id, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(description)
    .bind(created_at)
    .bind(created_at)
    .execute(&db.0)
    .await
    .unwrap();
    id
}

pub fn get(uri: &str, token: &str) -> Request {
    actix_test::TestRequest::get()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request()
}

pub fn post_json(uri: &str, token: &str, body: Value) -> Request {
    actix_test::TestRequest::post()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request()
}

pub fn put_json(uri: &str, token: &str, body: Value) -> Request {
    actix_test::TestRequest::put()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(body)
        .to_request()
}

pub fn delete(uri: &str, token: &str) -> Request {
    actix_test::TestRequest::delete()
        .uri(uri)
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request()
}

/// Minimal PNG file: signature plus a stub IHDR, enough for type sniffing.
pub fn png_bytes() -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]);
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&[0u8; 17]);
    data
}

pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

pub fn multipart_body(
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> MultipartBody {
    let boundary = format!("----chirp-test-{}", uuid::Uuid::new_v4());
    let mut bytes: Vec<u8> = Vec::new();
    for (name, value) in fields {
        bytes.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        bytes.extend_from_slice(value.as_bytes());
        bytes.extend_from_slice(b"\r\n");
    }
    for (name, filename, data) in files {
        bytes.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        bytes.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    MultipartBody { boundary, bytes }
}
