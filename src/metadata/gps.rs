//! GPS coordinate conversion.
//!
//! EXIF stores a coordinate as three rationals (degrees, minutes, seconds)
//! plus a hemisphere reference (`N`/`S`, `E`/`W`). Two renderings exist:
//! a display DMS string and a signed decimal degree value.

use serde::{Deserialize, Serialize};

use super::tags::Rational;

/// Which rendering the extractor should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFormat {
    #[default]
    Decimal,
    Dms,
}

impl std::str::FromStr for CoordinateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decimal" => Ok(CoordinateFormat::Decimal),
            "dms" => Ok(CoordinateFormat::Dms),
            other => Err(format!("unknown coordinate format: {other}")),
        }
    }
}

/// A converted coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Decimal(f64),
    Dms(String),
}

impl Coordinate {
    /// Rebuild from the stored text form: numbers are decimal, anything else DMS
    pub fn from_stored(s: &str) -> Self {
        match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Coordinate::Decimal(v),
            _ => Coordinate::Dms(s.to_string()),
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Coordinate::Decimal(v) => Some(*v),
            Coordinate::Dms(_) => None,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coordinate::Decimal(v) => write!(f, "{}", v),
            Coordinate::Dms(s) => f.write_str(s),
        }
    }
}

fn dms_parts(coordinate: &[Rational]) -> Option<(f64, f64, f64)> {
    if coordinate.len() < 3 {
        return None;
    }
    Some((
        coordinate[0].to_f64()?,
        coordinate[1].to_f64()?,
        coordinate[2].to_f64()?,
    ))
}

fn hemisphere(reference: Option<&str>) -> Option<&str> {
    reference.map(str::trim).filter(|r| !r.is_empty())
}

/// Format as `35°41'22" N`
pub fn to_dms_string(coordinate: &[Rational], reference: Option<&str>) -> Option<String> {
    let reference = hemisphere(reference)?;
    let (degrees, minutes, seconds) = dms_parts(coordinate)?;
    Some(format!("{}°{}'{}\" {}", degrees, minutes, seconds, reference))
}

/// Signed decimal degrees; southern and western hemispheres are negative
pub fn to_signed_decimal(coordinate: &[Rational], reference: Option<&str>) -> Option<f64> {
    let reference = hemisphere(reference)?;
    let (degrees, minutes, seconds) = dms_parts(coordinate)?;
    let value = degrees + minutes / 60.0 + seconds / 3600.0;

    if reference.eq_ignore_ascii_case("S") || reference.eq_ignore_ascii_case("W") {
        Some(-value)
    } else {
        Some(value)
    }
}

pub fn convert(
    coordinate: &[Rational],
    reference: Option<&str>,
    format: CoordinateFormat,
) -> Option<Coordinate> {
    match format {
        CoordinateFormat::Decimal => {
            to_signed_decimal(coordinate, reference).map(Coordinate::Decimal)
        }
        CoordinateFormat::Dms => to_dms_string(coordinate, reference).map(Coordinate::Dms),
    }
}
