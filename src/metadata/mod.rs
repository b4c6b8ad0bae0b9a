//! EXIF metadata extraction and normalization.

mod display;
mod extract;
pub mod format;
pub mod gps;
pub mod tags;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use display::ExifDisplay;
pub use extract::ExifExtractor;
pub use gps::{Coordinate, CoordinateFormat};
pub use tags::{KamadakTagReader, RawTag, RawTags, TagName, TagReadError, TagReader, TagValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("EXIF orientation must be 1-8, got {0}")]
pub struct InvalidOrientation(pub i64);

/// EXIF orientation code, always within 1..=8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Orientation(u8);

impl Orientation {
    pub fn new(code: i64) -> Option<Self> {
        Self::try_from(code).ok()
    }

    pub fn code(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Orientation {
    type Error = InvalidOrientation;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1..=8 => Ok(Orientation(code as u8)),
            _ => Err(InvalidOrientation(code)),
        }
    }
}

impl From<Orientation> for i64 {
    fn from(o: Orientation) -> Self {
        i64::from(o.0)
    }
}

/// Camera metadata normalized out of one uploaded image.
///
/// Every field is optional: firmware differs in what it embeds, and a
/// missing tag simply leaves its field empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizedExifData {
    pub taken_at: Option<NaiveDateTime>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    pub orientation: Option<Orientation>,
    pub iso: Option<u32>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    pub lens_serial: Option<String>,
    /// `num/den` as recorded
    pub focal_length: Option<String>,
    pub focal_length_35mm: Option<String>,
    /// `num/den` as recorded
    pub aperture: Option<String>,
    pub shutter_speed: Option<String>,
}

impl NormalizedExifData {
    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }
}
