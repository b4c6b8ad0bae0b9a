use serde::{Deserialize, Serialize};

use super::format::{
    format_aperture, format_focal_length, format_iso, format_shutter_speed, PLACEHOLDER,
};
use super::{Coordinate, NormalizedExifData};
use crate::camera;

/// Feed-ready strings for one photo. No field is ever empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExifDisplay {
    pub camera: String,
    pub lens: String,
    pub focal_length: String,
    pub focal_length_35mm: String,
    pub aperture: String,
    pub shutter_speed: String,
    pub iso: String,
    pub taken_at: String,
    pub location: String,
}

impl From<&NormalizedExifData> for ExifDisplay {
    fn from(exif: &NormalizedExifData) -> Self {
        let camera = camera::humanize(
            exif.camera_model
                .as_deref()
                .or(exif.camera_make.as_deref()),
        );

        let lens = exif
            .lens_model
            .as_deref()
            .or(exif.lens_make.as_deref())
            .unwrap_or(PLACEHOLDER)
            .to_string();

        let taken_at = exif
            .taken_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let location = match (&exif.latitude, &exif.longitude) {
            (Some(lat), Some(lon)) => format!("{}, {}", coordinate_text(lat), coordinate_text(lon)),
            _ => PLACEHOLDER.to_string(),
        };

        Self {
            camera,
            lens,
            focal_length: format_focal_length(exif.focal_length.as_deref()),
            focal_length_35mm: format_focal_length(exif.focal_length_35mm.as_deref()),
            aperture: format_aperture(exif.aperture.as_deref()),
            shutter_speed: format_shutter_speed(exif.shutter_speed.as_deref()),
            iso: format_iso(exif.iso),
            taken_at,
            location,
        }
    }
}

fn coordinate_text(coordinate: &Coordinate) -> String {
    match coordinate {
        Coordinate::Decimal(v) => format!("{:.5}", v),
        Coordinate::Dms(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_empty_record_shows_placeholders() {
        let display = ExifDisplay::from(&NormalizedExifData::default());
        assert_eq!(display.camera, camera::UNKNOWN_CAMERA);
        assert_eq!(display.lens, "-");
        assert_eq!(display.focal_length, "-");
        assert_eq!(display.aperture, "-");
        assert_eq!(display.shutter_speed, "-");
        assert_eq!(display.iso, "-");
        assert_eq!(display.taken_at, "-");
        assert_eq!(display.location, "-");
    }

    #[test]
    fn test_populated_record() {
        let exif = NormalizedExifData {
            taken_at: NaiveDate::from_ymd_opt(2024, 7, 14).and_then(|d| d.and_hms_opt(18, 5, 0)),
            camera_make: Some("SONY".to_string()),
            camera_model: Some("ILCE-7CM2".to_string()),
            latitude: Some(Coordinate::Decimal(35.689_722)),
            longitude: Some(Coordinate::Decimal(139.692_222)),
            iso: Some(100),
            lens_model: Some("FE 20-70mm F4 G".to_string()),
            focal_length: Some("6249513/1000000".to_string()),
            focal_length_35mm: Some("35".to_string()),
            aperture: Some("9/2".to_string()),
            shutter_speed: Some("0.004".to_string()),
            ..Default::default()
        };

        let display = ExifDisplay::from(&exif);
        assert_eq!(display.camera, "Sony α7C II");
        assert_eq!(display.lens, "FE 20-70mm F4 G");
        assert_eq!(display.focal_length, "6.25mm");
        assert_eq!(display.focal_length_35mm, "35mm");
        assert_eq!(display.aperture, "f/4.5");
        assert_eq!(display.shutter_speed, "1/250");
        assert_eq!(display.iso, "ISO 100");
        assert_eq!(display.taken_at, "2024-07-14 18:05");
        assert_eq!(display.location, "35.68972, 139.69222");
    }

    #[test]
    fn test_camera_falls_back_to_make() {
        let exif = NormalizedExifData {
            camera_make: Some("Apple".to_string()),
            ..Default::default()
        };
        assert_eq!(ExifDisplay::from(&exif).camera, "Apple");
    }

    #[test]
    fn test_dms_location_kept_verbatim() {
        let exif = NormalizedExifData {
            latitude: Some(Coordinate::Dms("35°41'22\" N".to_string())),
            longitude: Some(Coordinate::Dms("139°41'30\" E".to_string())),
            ..Default::default()
        };
        assert_eq!(
            ExifDisplay::from(&exif).location,
            "35°41'22\" N, 139°41'30\" E"
        );
    }
}
