use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

/// Photo catalog backed by SQLite
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Create in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS photos (
                id INTEGER PRIMARY KEY,
                storage_key TEXT UNIQUE NOT NULL,
                url TEXT NOT NULL,
                original_filename TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL CHECK (size_bytes >= 0),
                created_at TEXT NOT NULL,
                taken_at TEXT,
                camera_make TEXT,
                camera_model TEXT,
                latitude TEXT,
                longitude TEXT,
                orientation INTEGER CHECK (orientation IS NULL OR (orientation >= 1 AND orientation <= 8)),
                iso INTEGER CHECK (iso IS NULL OR iso >= 0),
                lens_make TEXT,
                lens_model TEXT,
                lens_serial TEXT,
                focal_length TEXT,
                focal_length_35mm TEXT,
                aperture TEXT,
                shutter_speed TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_photos_feed
                ON photos(COALESCE(taken_at, created_at) DESC);
            "#,
        )?;
        Ok(())
    }

    /// Get a reference to the underlying connection (for testing)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
