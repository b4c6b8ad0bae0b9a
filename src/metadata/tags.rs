//! Raw EXIF tag reading.
//!
//! The extractor never touches TIFF/IFD structures itself: it asks a
//! [`TagReader`] for a map of named tags, each carrying a typed value and a
//! human readable description. [`KamadakTagReader`] is the production reader,
//! backed by `kamadak-exif`.

use std::collections::HashMap;
use std::io::Cursor;

use exif::{In, Tag, Value};
use thiserror::Error;

use super::format::{round_to, whole_reciprocal};

/// EXIF tags the normalization pipeline cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagName {
    DateTimeOriginal,
    Make,
    Model,
    Orientation,
    PhotographicSensitivity,
    LensMake,
    LensModel,
    LensSerialNumber,
    FocalLength,
    FocalLengthIn35mmFilm,
    FNumber,
    ExposureTime,
    ShutterSpeedValue,
    GPSLatitude,
    GPSLatitudeRef,
    GPSLongitude,
    GPSLongitudeRef,
}

impl TagName {
    pub const ALL: [TagName; 17] = [
        TagName::DateTimeOriginal,
        TagName::Make,
        TagName::Model,
        TagName::Orientation,
        TagName::PhotographicSensitivity,
        TagName::LensMake,
        TagName::LensModel,
        TagName::LensSerialNumber,
        TagName::FocalLength,
        TagName::FocalLengthIn35mmFilm,
        TagName::FNumber,
        TagName::ExposureTime,
        TagName::ShutterSpeedValue,
        TagName::GPSLatitude,
        TagName::GPSLatitudeRef,
        TagName::GPSLongitude,
        TagName::GPSLongitudeRef,
    ];

    fn exif_tag(self) -> Tag {
        match self {
            TagName::DateTimeOriginal => Tag::DateTimeOriginal,
            TagName::Make => Tag::Make,
            TagName::Model => Tag::Model,
            TagName::Orientation => Tag::Orientation,
            TagName::PhotographicSensitivity => Tag::PhotographicSensitivity,
            TagName::LensMake => Tag::LensMake,
            TagName::LensModel => Tag::LensModel,
            TagName::LensSerialNumber => Tag::LensSerialNumber,
            TagName::FocalLength => Tag::FocalLength,
            TagName::FocalLengthIn35mmFilm => Tag::FocalLengthIn35mmFilm,
            TagName::FNumber => Tag::FNumber,
            TagName::ExposureTime => Tag::ExposureTime,
            TagName::ShutterSpeedValue => Tag::ShutterSpeedValue,
            TagName::GPSLatitude => Tag::GPSLatitude,
            TagName::GPSLatitudeRef => Tag::GPSLatitudeRef,
            TagName::GPSLongitude => Tag::GPSLongitude,
            TagName::GPSLongitudeRef => Tag::GPSLongitudeRef,
        }
    }
}

/// A signed EXIF rational. Unsigned rationals widen losslessly into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    pub fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Quotient as a float, `None` for a zero denominator
    pub fn to_f64(self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }
}

impl std::fmt::Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Typed tag payload
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(Vec<String>),
    Integer(Vec<i64>),
    Rational(Vec<Rational>),
    Float(Vec<f64>),
    Bytes(Vec<u8>),
}

impl From<&Value> for TagValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Ascii(parts) => TagValue::Text(
                parts
                    .iter()
                    .map(|p| clean_text(&String::from_utf8_lossy(p)))
                    .collect(),
            ),
            Value::Byte(v) => TagValue::Integer(v.iter().map(|&x| i64::from(x)).collect()),
            Value::Short(v) => TagValue::Integer(v.iter().map(|&x| i64::from(x)).collect()),
            Value::Long(v) => TagValue::Integer(v.iter().map(|&x| i64::from(x)).collect()),
            Value::SByte(v) => TagValue::Integer(v.iter().map(|&x| i64::from(x)).collect()),
            Value::SShort(v) => TagValue::Integer(v.iter().map(|&x| i64::from(x)).collect()),
            Value::SLong(v) => TagValue::Integer(v.iter().map(|&x| i64::from(x)).collect()),
            Value::Rational(v) => TagValue::Rational(
                v.iter()
                    .map(|r| Rational::new(i64::from(r.num), i64::from(r.denom)))
                    .collect(),
            ),
            Value::SRational(v) => TagValue::Rational(
                v.iter()
                    .map(|r| Rational::new(i64::from(r.num), i64::from(r.denom)))
                    .collect(),
            ),
            Value::Float(v) => TagValue::Float(v.iter().map(|&x| f64::from(x)).collect()),
            Value::Double(v) => TagValue::Float(v.clone()),
            Value::Undefined(data, _) => TagValue::Bytes(data.clone()),
            Value::Unknown(..) => TagValue::Bytes(Vec::new()),
        }
    }
}

/// One tag as returned by a [`TagReader`]
#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    pub value: TagValue,
    pub description: String,
}

impl RawTag {
    pub fn new(value: TagValue, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
        }
    }

    /// Text tag whose description is its (first) string
    pub fn text(s: &str) -> Self {
        Self::new(TagValue::Text(vec![s.to_string()]), s)
    }

    pub fn integer(v: i64) -> Self {
        Self::new(TagValue::Integer(vec![v]), v.to_string())
    }

    pub fn rationals(values: &[(i64, i64)]) -> Self {
        let rationals: Vec<Rational> = values.iter().map(|&(n, d)| Rational::new(n, d)).collect();
        let description = rationals
            .iter()
            .map(Rational::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(TagValue::Rational(rationals), description)
    }
}

/// Tags found in one image, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTags {
    tags: HashMap<TagName, RawTag>,
}

impl RawTags {
    pub fn insert(&mut self, name: TagName, tag: RawTag) {
        self.tags.insert(name, tag);
    }

    pub fn with(mut self, name: TagName, tag: RawTag) -> Self {
        self.insert(name, tag);
        self
    }

    pub fn get(&self, name: TagName) -> Option<&RawTag> {
        self.tags.get(&name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// First non-blank string value
    pub fn text(&self, name: TagName) -> Option<&str> {
        match &self.get(name)?.value {
            TagValue::Text(parts) => parts
                .iter()
                .map(|s| s.as_str())
                .find(|s| !s.trim().is_empty()),
            _ => None,
        }
    }

    /// First integer value
    pub fn integer(&self, name: TagName) -> Option<i64> {
        match &self.get(name)?.value {
            TagValue::Integer(v) => v.first().copied(),
            TagValue::Float(v) => v.first().filter(|f| f.fract() == 0.0).map(|&f| f as i64),
            _ => None,
        }
    }

    pub fn rationals(&self, name: TagName) -> Option<&[Rational]> {
        match &self.get(name)?.value {
            TagValue::Rational(v) if !v.is_empty() => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Non-empty description
    pub fn description(&self, name: TagName) -> Option<&str> {
        self.get(name)
            .map(|t| t.description.trim())
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum TagReadError {
    #[error("failed to read EXIF: {0}")]
    Exif(#[from] exif::Error),
}

/// Collaborator that turns an image buffer into raw tags.
///
/// Implementations may fail on anything that is not an image with EXIF data;
/// callers decide how to degrade.
pub trait TagReader: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<RawTags, TagReadError>;
}

/// [`TagReader`] backed by `kamadak-exif`.
///
/// Handles every container `exif::Reader::read_from_container` does (JPEG,
/// TIFF, HEIF, PNG, WebP) and keeps PRIMARY IFD fields only.
#[derive(Debug, Default, Clone, Copy)]
pub struct KamadakTagReader;

impl TagReader for KamadakTagReader {
    fn load(&self, bytes: &[u8]) -> Result<RawTags, TagReadError> {
        let mut cursor = Cursor::new(bytes);
        let exif = exif::Reader::new().read_from_container(&mut cursor)?;

        let mut tags = RawTags::default();
        for name in TagName::ALL {
            let Some(field) = exif.get_field(name.exif_tag(), In::PRIMARY) else {
                continue;
            };
            let value = TagValue::from(&field.value);
            let description = describe(name, &value)
                .unwrap_or_else(|| field.display_value().to_string());
            tags.insert(name, RawTag::new(value, description));
        }
        Ok(tags)
    }
}

/// Descriptions that differ from kamadak's own rendering
fn describe(name: TagName, value: &TagValue) -> Option<String> {
    match (name, value) {
        (_, TagValue::Text(parts)) => Some(parts.join(", ")),
        (TagName::ExposureTime, TagValue::Rational(v)) => {
            exposure_description(v.first()?.to_f64()?)
        }
        (TagName::ShutterSpeedValue, TagValue::Rational(v)) => {
            // APEX time value: exposure = 2^-Tv seconds, snapped to 1/N below a second
            let tv = v.first()?.to_f64()?;
            if tv > 0.0 {
                exposure_description(1.0 / 2f64.powf(tv).round())
            } else {
                exposure_description(2f64.powf(-tv))
            }
        }
        _ => None,
    }
}

/// `1/N` when the exposure is a whole reciprocal, decimal seconds otherwise
fn exposure_description(seconds: f64) -> Option<String> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    if seconds >= 1.0 {
        return Some(format!("{}", round_to(seconds, 1)));
    }
    if let Some(n) = whole_reciprocal(seconds) {
        return Some(format!("1/{}", n));
    }
    // too short to render as decimal seconds and not 1/N either
    let rounded = round_to(seconds, 4);
    (rounded > 0.0).then(|| format!("{}", rounded))
}

fn clean_text(s: &str) -> String {
    s.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
