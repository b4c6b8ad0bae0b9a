use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::metadata::{CoordinateFormat, ExifDisplay, ExifExtractor, NormalizedExifData};

/// Extracted metadata for one file, raw and formatted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExifReport {
    pub exif: NormalizedExifData,
    pub display: ExifDisplay,
}

/// Read a local image and extract its metadata.
///
/// Only an unreadable file is an error. Files without EXIF produce an
/// empty record.
pub fn run_exif(path: &Path, format: CoordinateFormat) -> Result<ExifReport> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let exif = ExifExtractor::new(format).extract(&bytes);
    let display = ExifDisplay::from(&exif);
    Ok(ExifReport { exif, display })
}
