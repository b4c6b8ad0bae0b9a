use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::gps::{self, CoordinateFormat};
use super::tags::{KamadakTagReader, RawTags, TagName, TagReader};
use super::{NormalizedExifData, Orientation};

/// Maps raw EXIF tags onto [`NormalizedExifData`].
///
/// Extraction is best effort: a buffer the tag reader cannot parse yields an
/// all-empty record and a warning, never an error, so an image without EXIF
/// never blocks an upload.
#[derive(Debug, Clone, Default)]
pub struct ExifExtractor<R = KamadakTagReader> {
    reader: R,
    coordinate_format: CoordinateFormat,
}

impl ExifExtractor<KamadakTagReader> {
    pub fn new(coordinate_format: CoordinateFormat) -> Self {
        Self::with_reader(KamadakTagReader, coordinate_format)
    }
}

impl<R: TagReader> ExifExtractor<R> {
    pub fn with_reader(reader: R, coordinate_format: CoordinateFormat) -> Self {
        Self {
            reader,
            coordinate_format,
        }
    }

    pub fn extract(&self, bytes: &[u8]) -> NormalizedExifData {
        match self.reader.load(bytes) {
            Ok(tags) => {
                debug!(tags = tags.len(), "EXIF tags read");
                self.normalize(&tags)
            }
            Err(e) => {
                warn!(error = %e, size = bytes.len(), "EXIF extraction failed, continuing without metadata");
                NormalizedExifData::default()
            }
        }
    }

    /// Each field is looked up on its own; one bad tag never hides the others.
    pub fn normalize(&self, tags: &RawTags) -> NormalizedExifData {
        NormalizedExifData {
            taken_at: tags.text(TagName::DateTimeOriginal).and_then(parse_exif_datetime),
            camera_make: owned_text(tags, TagName::Make),
            camera_model: owned_text(tags, TagName::Model),
            latitude: self.coordinate(tags, TagName::GPSLatitude, TagName::GPSLatitudeRef),
            longitude: self.coordinate(tags, TagName::GPSLongitude, TagName::GPSLongitudeRef),
            orientation: tags.integer(TagName::Orientation).and_then(Orientation::new),
            iso: tags
                .integer(TagName::PhotographicSensitivity)
                .and_then(|v| u32::try_from(v).ok()),
            lens_make: owned_text(tags, TagName::LensMake),
            lens_model: owned_text(tags, TagName::LensModel),
            lens_serial: owned_text(tags, TagName::LensSerialNumber),
            focal_length: first_rational(tags, TagName::FocalLength),
            focal_length_35mm: tags
                .integer(TagName::FocalLengthIn35mmFilm)
                .map(|v| v.to_string()),
            aperture: first_rational(tags, TagName::FNumber),
            shutter_speed: tags
                .description(TagName::ExposureTime)
                .or_else(|| tags.description(TagName::ShutterSpeedValue))
                .map(str::to_string),
        }
    }

    fn coordinate(
        &self,
        tags: &RawTags,
        coord: TagName,
        reference: TagName,
    ) -> Option<gps::Coordinate> {
        let rationals = tags.rationals(coord)?;
        let converted = gps::convert(rationals, tags.text(reference), self.coordinate_format);
        if converted.is_none() {
            debug!(tag = ?coord, "GPS coordinate present but not convertible");
        }
        converted
    }
}

fn owned_text(tags: &RawTags, name: TagName) -> Option<String> {
    tags.text(name).map(|s| s.trim().to_string())
}

fn first_rational(tags: &RawTags, name: TagName) -> Option<String> {
    tags.rationals(name)?.first().map(|r| r.to_string())
}

/// EXIF writes `YYYY:MM:DD HH:MM:SS`; some software uses dashes in the date
fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let (date, time) = raw.trim().split_once(' ')?;
    let normalized = format!("{} {}", date.replace(':', "-"), time.trim());
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S").ok()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;
    use exif::experimental::Writer;
    use exif::{Field, In, Tag, Value};

    use super::*;
    use crate::metadata::tags::{RawTag, TagReadError};
    use crate::metadata::Coordinate;

    struct FixedReader(RawTags);

    impl TagReader for FixedReader {
        fn load(&self, _bytes: &[u8]) -> Result<RawTags, TagReadError> {
            Ok(self.0.clone())
        }
    }

    fn extractor(tags: RawTags) -> ExifExtractor<FixedReader> {
        ExifExtractor::with_reader(FixedReader(tags), CoordinateFormat::Decimal)
    }

    fn ascii(tag: Tag, s: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![s.as_bytes().to_vec()]),
        }
    }

    /// Wrap a TIFF/EXIF block written by kamadak into a bare JPEG APP1 segment
    fn jpeg_with_exif(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let segment_len = (2 + 6 + tiff.len()) as u16;
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&segment_len.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    #[test]
    fn test_full_tag_mapping() {
        let tags = RawTags::default()
            .with(TagName::DateTimeOriginal, RawTag::text("2024:05:01 14:30:05"))
            .with(TagName::Make, RawTag::text("SONY"))
            .with(TagName::Model, RawTag::text("ILCE-7CM2"))
            .with(TagName::Orientation, RawTag::integer(6))
            .with(TagName::PhotographicSensitivity, RawTag::integer(400))
            .with(TagName::LensMake, RawTag::text("Sony"))
            .with(TagName::LensModel, RawTag::text("FE 40mm F2.5 G"))
            .with(TagName::LensSerialNumber, RawTag::text("0123456"))
            .with(TagName::FocalLength, RawTag::rationals(&[(40, 1)]))
            .with(TagName::FocalLengthIn35mmFilm, RawTag::integer(40))
            .with(TagName::FNumber, RawTag::rationals(&[(5, 2)]))
            .with(TagName::ExposureTime, RawTag::rationals(&[(1, 250)]))
            .with(TagName::GPSLatitude, RawTag::rationals(&[(35, 1), (30, 1), (0, 1)]))
            .with(TagName::GPSLatitudeRef, RawTag::text("N"))
            .with(TagName::GPSLongitude, RawTag::rationals(&[(139, 1), (45, 1), (0, 1)]))
            .with(TagName::GPSLongitudeRef, RawTag::text("E"));

        let data = extractor(tags).extract(b"ignored");

        assert_eq!(
            data.taken_at,
            NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(14, 30, 5))
        );
        assert_eq!(data.camera_make.as_deref(), Some("SONY"));
        assert_eq!(data.camera_model.as_deref(), Some("ILCE-7CM2"));
        assert_eq!(data.orientation.map(Orientation::code), Some(6));
        assert_eq!(data.iso, Some(400));
        assert_eq!(data.lens_make.as_deref(), Some("Sony"));
        assert_eq!(data.lens_model.as_deref(), Some("FE 40mm F2.5 G"));
        assert_eq!(data.lens_serial.as_deref(), Some("0123456"));
        assert_eq!(data.focal_length.as_deref(), Some("40/1"));
        assert_eq!(data.focal_length_35mm.as_deref(), Some("40"));
        assert_eq!(data.aperture.as_deref(), Some("5/2"));
        assert_eq!(data.shutter_speed.as_deref(), Some("1/250"));
        assert_eq!(data.latitude, Some(Coordinate::Decimal(35.5)));
        assert_eq!(data.longitude, Some(Coordinate::Decimal(139.75)));
    }

    #[test]
    fn test_dms_format_configuration() {
        let tags = RawTags::default()
            .with(TagName::GPSLatitude, RawTag::rationals(&[(35, 1), (41, 1), (22, 1)]))
            .with(TagName::GPSLatitudeRef, RawTag::text("N"));
        let extractor = ExifExtractor::with_reader(FixedReader(tags), CoordinateFormat::Dms);

        let data = extractor.extract(&[]);
        assert_eq!(
            data.latitude,
            Some(Coordinate::Dms("35°41'22\" N".to_string()))
        );
        assert_eq!(data.longitude, None);
    }

    #[test]
    fn test_shutter_speed_falls_back_to_shutter_speed_value() {
        let tags = RawTags::default().with(
            TagName::ShutterSpeedValue,
            RawTag::new(
                crate::metadata::TagValue::Rational(vec![]),
                "1/125",
            ),
        );
        assert_eq!(
            extractor(tags).extract(&[]).shutter_speed.as_deref(),
            Some("1/125")
        );

        let both = RawTags::default()
            .with(TagName::ExposureTime, RawTag::rationals(&[(1, 60)]))
            .with(TagName::ShutterSpeedValue, RawTag::text("1/125"));
        assert_eq!(
            extractor(both).extract(&[]).shutter_speed.as_deref(),
            Some("1/60")
        );
    }

    #[test]
    fn test_malformed_tags_degrade_independently() {
        let tags = RawTags::default()
            .with(TagName::DateTimeOriginal, RawTag::text("0000:00:00 00:00:00"))
            .with(TagName::Orientation, RawTag::integer(42))
            .with(TagName::PhotographicSensitivity, RawTag::integer(-5))
            .with(TagName::GPSLatitude, RawTag::rationals(&[(35, 1)]))
            .with(TagName::GPSLatitudeRef, RawTag::text("N"))
            .with(TagName::GPSLongitude, RawTag::rationals(&[(139, 1), (45, 1), (0, 1)]))
            .with(TagName::Make, RawTag::integer(7))
            .with(TagName::Model, RawTag::text("X100V"));

        let data = extractor(tags).extract(&[]);
        assert_eq!(data.taken_at, None);
        assert_eq!(data.orientation, None);
        assert_eq!(data.iso, None);
        assert_eq!(data.latitude, None);
        // longitude has no reference tag
        assert_eq!(data.longitude, None);
        assert_eq!(data.camera_make, None);
        assert_eq!(data.camera_model.as_deref(), Some("X100V"));
    }

    #[test]
    fn test_parse_exif_datetime() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31).and_then(|d| d.and_hms_opt(23, 59, 0));
        assert_eq!(parse_exif_datetime("2023:12:31 23:59:00"), expected);
        assert_eq!(parse_exif_datetime("2023-12-31 23:59:00"), expected);
        assert_eq!(parse_exif_datetime("garbage"), None);
        assert_eq!(parse_exif_datetime(""), None);
    }

    #[test]
    fn test_garbage_bytes_yield_empty_record() {
        let data = ExifExtractor::new(CoordinateFormat::Decimal).extract(b"\x00\x01not an image");
        assert_eq!(data, NormalizedExifData::default());
    }

    #[test]
    fn test_empty_buffer_yields_empty_record() {
        let data = ExifExtractor::new(CoordinateFormat::Decimal).extract(&[]);
        assert!(!data.has_any());
    }

    #[test]
    fn test_jpeg_with_only_make_and_model() {
        let jpeg = jpeg_with_exif(&[ascii(Tag::Make, "FUJIFILM"), ascii(Tag::Model, "X-T5")]);

        let data = ExifExtractor::new(CoordinateFormat::Decimal).extract(&jpeg);
        assert_eq!(
            data,
            NormalizedExifData {
                camera_make: Some("FUJIFILM".to_string()),
                camera_model: Some("X-T5".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_jpeg_with_exposure_and_gps() {
        let fields = [
            ascii(Tag::Model, "ILCE-7M4"),
            ascii(Tag::DateTimeOriginal, "2024:03:10 08:15:00"),
            Field {
                tag: Tag::FNumber,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![exif::Rational { num: 9, denom: 2 }]),
            },
            Field {
                tag: Tag::ExposureTime,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![exif::Rational { num: 1, denom: 500 }]),
            },
            Field {
                tag: Tag::PhotographicSensitivity,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![200]),
            },
            Field {
                tag: Tag::GPSLatitude,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![
                    exif::Rational { num: 33, denom: 1 },
                    exif::Rational { num: 52, denom: 1 },
                    exif::Rational { num: 4, denom: 1 },
                ]),
            },
            ascii(Tag::GPSLatitudeRef, "S"),
        ];
        let jpeg = jpeg_with_exif(&fields);

        let data = ExifExtractor::new(CoordinateFormat::Decimal).extract(&jpeg);
        assert_eq!(data.camera_model.as_deref(), Some("ILCE-7M4"));
        assert_eq!(data.aperture.as_deref(), Some("9/2"));
        assert_eq!(data.shutter_speed.as_deref(), Some("1/500"));
        assert_eq!(data.iso, Some(200));
        assert!(data.taken_at.is_some());
        let latitude = data.latitude.and_then(|c| c.as_decimal()).unwrap();
        assert!(latitude < -33.0);
        assert_eq!(data.longitude, None);
    }
}
