use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::Photo;
use crate::metadata::{ExifDisplay, NormalizedExifData};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoResponse {
    pub id: i64,
    pub url: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: NaiveDateTime,
    pub exif: NormalizedExifData,
    pub display: ExifDisplay,
}

impl From<Photo> for PhotoResponse {
    fn from(photo: Photo) -> Self {
        let display = ExifDisplay::from(&photo.exif);
        Self {
            id: photo.id,
            url: photo.url,
            original_filename: photo.original_filename,
            content_type: photo.content_type,
            size_bytes: photo.size_bytes,
            created_at: photo.created_at,
            exif: photo.exif,
            display,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedPhotos {
    pub photos: Vec<PhotoResponse>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

#[derive(Deserialize)]
pub struct PaginationParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}
