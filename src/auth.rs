use crate::config::Config;
use crate::errors::ApiError;
use crate::models::user::User;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use futures_util::future::{err, ok, Ready};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token payload: the user record minus the password hash, plus expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub account: String,
    pub name: String,
    pub email: String,
    pub introduction: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
    pub role: String,
    pub exp: usize,
}

pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal)?
        .to_string())
}

pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

pub fn create_token(user: &User, cfg: &Config) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::days(cfg.token_validity_days)).timestamp() as usize;
    let claims = Claims {
        sub: user.id.clone(),
        account: user.account.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        introduction: user.introduction.clone(),
        avatar: user.avatar.clone(),
        cover_image: user.cover_image.clone(),
        role: user.role.clone(),
        exp,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret_bytes()),
    )
    .map_err(|_| ApiError::Internal)
}

pub fn verify_token(token: &str, cfg: &Config) -> Result<Claims, ApiError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(cfg.jwt_secret_bytes()), &v)
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized)
}

/// The acting principal, decoded from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let cfg = req.app_data::<actix_web::web::Data<Config>>().unwrap();
        if let Some(h) = req.headers().get("Authorization") {
            if let Ok(s) = h.to_str() {
                if let Some(token) = s.strip_prefix("Bearer ") {
                    if let Ok(claims) = verify_token(token, cfg) {
                        return ok(AuthUser {
                            user_id: claims.sub,
                            role: claims.role,
                        });
                    }
                }
            }
        }
        err(ApiError::Unauthorized)
    }
}
