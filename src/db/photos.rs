use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::Database;
use crate::metadata::{Coordinate, NormalizedExifData, Orientation};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const PHOTO_COLUMNS: &str = "id, storage_key, url, original_filename, content_type, size_bytes, created_at,
     taken_at, camera_make, camera_model, latitude, longitude, orientation, iso,
     lens_make, lens_model, lens_serial, focal_length, focal_length_35mm, aperture, shutter_speed";

/// A stored photo with its EXIF metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub id: i64,
    pub storage_key: String,
    pub url: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: NaiveDateTime,
    pub exif: NormalizedExifData,
}

/// Everything needed to insert a photo
#[derive(Debug, Clone)]
pub struct NewPhoto<'a> {
    pub storage_key: &'a str,
    pub url: &'a str,
    pub original_filename: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub exif: &'a NormalizedExifData,
}

fn parse_timestamp(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.map(|s| {
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn row_to_photo(row: &Row) -> rusqlite::Result<Photo> {
    let created_at = parse_timestamp(6, Some(row.get(6)?))?.unwrap_or_default();
    let orientation: Option<i64> = row.get(12)?;
    let iso: Option<i64> = row.get(13)?;
    let latitude: Option<String> = row.get(10)?;
    let longitude: Option<String> = row.get(11)?;

    Ok(Photo {
        id: row.get(0)?,
        storage_key: row.get(1)?,
        url: row.get(2)?,
        original_filename: row.get(3)?,
        content_type: row.get(4)?,
        size_bytes: row.get(5)?,
        created_at,
        exif: NormalizedExifData {
            taken_at: parse_timestamp(7, row.get(7)?)?,
            camera_make: row.get(8)?,
            camera_model: row.get(9)?,
            latitude: latitude.as_deref().map(Coordinate::from_stored),
            longitude: longitude.as_deref().map(Coordinate::from_stored),
            orientation: orientation.and_then(Orientation::new),
            iso: iso.and_then(|v| u32::try_from(v).ok()),
            lens_make: row.get(14)?,
            lens_model: row.get(15)?,
            lens_serial: row.get(16)?,
            focal_length: row.get(17)?,
            focal_length_35mm: row.get(18)?,
            aperture: row.get(19)?,
            shutter_speed: row.get(20)?,
        },
    })
}

impl Database {
    /// Insert a new photo, returns its ID
    pub fn insert_photo(&self, photo: &NewPhoto) -> Result<i64> {
        let exif = photo.exif;
        let created_at = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
        let taken_at = exif
            .taken_at
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string());

        self.connection().execute(
            "INSERT INTO photos (storage_key, url, original_filename, content_type, size_bytes, created_at,
                 taken_at, camera_make, camera_model, latitude, longitude, orientation, iso,
                 lens_make, lens_model, lens_serial, focal_length, focal_length_35mm, aperture, shutter_speed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                photo.storage_key,
                photo.url,
                photo.original_filename,
                photo.content_type,
                photo.size_bytes,
                created_at,
                taken_at,
                exif.camera_make,
                exif.camera_model,
                exif.latitude.as_ref().map(Coordinate::to_string),
                exif.longitude.as_ref().map(Coordinate::to_string),
                exif.orientation.map(Orientation::code),
                exif.iso,
                exif.lens_make,
                exif.lens_model,
                exif.lens_serial,
                exif.focal_length,
                exif.focal_length_35mm,
                exif.aperture,
                exif.shutter_speed,
            ],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    /// Get a photo by ID
    pub fn get_photo(&self, id: i64) -> Result<Option<Photo>> {
        let sql = format!("SELECT {} FROM photos WHERE id = ?1", PHOTO_COLUMNS);
        let photo = self
            .connection()
            .query_row(&sql, [id], row_to_photo)
            .optional()?;
        Ok(photo)
    }

    /// One page of the feed, newest first, plus the total photo count
    pub fn list_photos(&self, page: usize, per_page: usize) -> Result<(Vec<Photo>, usize)> {
        let total: i64 = self
            .connection()
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;

        // A page past anything SQLite can address is simply empty
        let offset = (page.max(1) - 1)
            .checked_mul(per_page)
            .and_then(|offset| i64::try_from(offset).ok());
        let (Some(offset), Ok(limit)) = (offset, i64::try_from(per_page)) else {
            return Ok((Vec::new(), total as usize));
        };

        let sql = format!(
            "SELECT {} FROM photos
             ORDER BY COALESCE(taken_at, created_at) DESC, id DESC
             LIMIT ?1 OFFSET ?2",
            PHOTO_COLUMNS
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt.query_map(params![limit, offset], row_to_photo)?;
        let photos = rows.collect::<Result<Vec<_>, _>>()?;

        Ok((photos, total as usize))
    }

    /// Delete a photo row, returns whether one existed
    pub fn delete_photo(&self, id: i64) -> Result<bool> {
        let deleted = self
            .connection()
            .execute("DELETE FROM photos WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }
}
