use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use tokio_util::io::ReaderStream;
use tracing::{error, warn};

use crate::db::{Database, NewPhoto};
use crate::storage::StorageError;
use crate::upload::UploadError;

use super::models::*;
use super::AppState;

// ==================== Health ====================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ==================== Photos ====================

pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PhotoResponse>), AppError> {
    let filename = params.filename.trim().to_string();
    if filename.is_empty() {
        return Err(AppError::BadRequest("filename is required".into()));
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let uploaded = state.uploads.upload(&filename, &body, content_type).await?;

    let key = uploaded.key.clone();
    let inserted = spawn_db(state.db.clone(), move |db| {
        let id = db.insert_photo(&NewPhoto {
            storage_key: &uploaded.key,
            url: &uploaded.url,
            original_filename: &filename,
            content_type: &uploaded.content_type,
            size_bytes: uploaded.size_bytes as i64,
            exif: &uploaded.exif,
        })?;
        db.get_photo(id)
    })
    .await;

    match inserted {
        Ok(Some(photo)) => Ok((StatusCode::CREATED, Json(photo.into()))),
        Ok(None) => Err(AppError::Internal("inserted photo not found".into())),
        Err(e) => {
            // don't leave an orphaned blob behind a failed insert
            if let Err(cleanup) = state.uploads.remove(&key).await {
                warn!(key = %key, error = %cleanup, "Failed to remove orphaned blob");
            }
            Err(e)
        }
    }
}

pub async fn list_photos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedPhotos>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(50).clamp(1, 200);

    let (photos, total) = spawn_db(state.db.clone(), move |db| db.list_photos(page, per_page)).await?;

    Ok(Json(PaginatedPhotos {
        photos: photos.into_iter().map(PhotoResponse::from).collect(),
        total,
        page,
        per_page,
    }))
}

pub async fn get_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PhotoResponse>, AppError> {
    let photo = spawn_db(state.db.clone(), move |db| db.get_photo(id))
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(photo.into()))
}

pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let photo = spawn_db(state.db.clone(), move |db| {
        let photo = db.get_photo(id)?;
        if photo.is_some() {
            db.delete_photo(id)?;
        }
        Ok(photo)
    })
    .await?
    .ok_or(AppError::NotFound)?;

    // the row is already gone; a leftover blob is only logged
    match state.uploads.remove(&photo.storage_key).await {
        Ok(()) | Err(StorageError::NotFound(_)) => {}
        Err(e) => {
            warn!(id, key = %photo.storage_key, error = %e, "Failed to remove blob of deleted photo");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

// ==================== Media ====================

pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if bucket != state.uploads.urls().bucket() {
        return Err(AppError::NotFound);
    }

    let reader = state.uploads.store().open_read(&key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_path(&key)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "max-age=86400")
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()))
}

// ==================== Helpers ====================

async fn spawn_db<F, T>(db: Arc<Mutex<Database>>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let db = db.lock().map_err(|_| AppError::Internal("Database lock poisoned".into()))?;
        f(&db).map_err(|e| AppError::Internal(e.to_string()))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

// ==================== Error Type ====================

#[derive(Debug)]
pub enum AppError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => AppError::NotFound,
            StorageError::InvalidKey(key) => AppError::BadRequest(format!("invalid key: {}", key)),
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Empty => AppError::BadRequest("upload body is empty".into()),
            UploadError::Storage(e) => AppError::Internal(format!("upload failed: {}", e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
