use crate::{config::Config, db::Db, errors::ApiError, models::file::StoredFile};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt as _;
use sanitize_filename::sanitize;
use std::io::Write;
use std::path::Path;

pub struct SavedFile {
    pub file_id: String,
    pub original_name: String,
}

// Lookup is by id only; the filename segment is cosmetic.
pub fn file_url(file_id: &str, original_name: &str) -> String {
    format!("/files/{}/{}", file_id, urlencoding::encode(original_name))
}

/// Stores one multipart image part on disk and records it in the files table.
/// Avatar and cover uploads go through here.
pub async fn save_multipart_file(
    cfg: &Config,
    db: &Db,
    user_id: &str,
    mut field: actix_multipart::Field,
) -> Result<SavedFile, ApiError> {
    let content_disposition = field.content_disposition().cloned();
    let original = content_disposition
        .and_then(|cd| cd.get_filename().map(|s| s.to_string()))
        .unwrap_or_else(|| "upload.bin".into());
    let original_safe = sanitize(&original);
    let mut data: Vec<u8> = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|_| ApiError::BadRequest("upload read error".into()))?
    {
        data.extend_from_slice(&chunk);
        if data.len() > cfg.max_upload_size {
            return Err(ApiError::BadRequest("file too large".into()));
        }
    }
    let mime = infer::get(&data).map(|t| t.mime_type().to_string());
    if !mime.as_deref().is_some_and(|m| m.starts_with("image/")) {
        return Err(ApiError::BadRequest(
            "Only image uploads are allowed".into(),
        ));
    }
    let id = uuid::Uuid::new_v4().to_string();
    let ext = Path::new(&original_safe)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("bin");
    let stored_name = format!("{}.{}", id, ext);
    let path = std::path::Path::new(&cfg.uploads_dir).join(&stored_name);
    let mut f = std::fs::File::create(&path).map_err(|_| ApiError::Internal)?;
    f.write_all(&data).map_err(|_| ApiError::Internal)?;

    sqlx::query("INSERT INTO files(id, user_id, original_name, stored_name, mime_type, size_bytes, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
        .bind(&id).bind(user_id).bind(&original_safe).bind(&stored_name).bind(&mime)
        .bind(data.len() as i64).bind(chrono::Utc::now())
        .execute(&db.0).await?;

    Ok(SavedFile {
        file_id: id,
        original_name: original_safe,
    })
}

pub async fn get_file(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    req: HttpRequest,
    path: web::Path<(String, String)>, // (id, filename) - filename is ignored for lookup
) -> Result<HttpResponse, ApiError> {
    let (id, _filename) = path.into_inner();

    let file = sqlx::query_as::<_, StoredFile>(
        "SELECT id, user_id, original_name, stored_name, mime_type, size_bytes, created_at FROM files WHERE id = ?",
    )
    .bind(&id)
    .fetch_optional(&db.0)
    .await?
    .ok_or_else(|| ApiError::NotFound("File not found".into()))?;

    let p = std::path::Path::new(&cfg.uploads_dir).join(&file.stored_name);
    if !p.exists() {
        return Err(ApiError::NotFound("File not found".into()));
    }

    let named = actix_files::NamedFile::open_async(p)
        .await
        .map_err(|_| ApiError::Internal)?
        .use_last_modified(true)
        .prefer_utf8(true)
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(file.original_name.clone())],
        });

    let mut resp = named.into_response(&req);
    if let Some(m) = &file.mime_type {
        if let Ok(val) = actix_web::http::header::HeaderValue::from_str(m) {
            resp.headers_mut()
                .insert(actix_web::http::header::CONTENT_TYPE, val);
        }
    }
    Ok(resp)
}
