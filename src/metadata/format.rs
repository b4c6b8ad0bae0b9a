//! Display formatting for raw EXIF values.
//!
//! Every function here is total: unknown or malformed input comes back
//! unchanged and missing input becomes [`PLACEHOLDER`].

/// Shown for fields a camera did not record
pub const PLACEHOLDER: &str = "-";

/// `"6249513/1000000"` -> `"6.25mm"`, `"24/1"` -> `"24mm"`
pub fn format_focal_length(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return PLACEHOLDER.to_string();
    };
    if raw.contains("mm") {
        return raw.to_string();
    }
    match numeric_value(raw) {
        Some(value) => format!("{}mm", round_to(value, 2)),
        None => raw.to_string(),
    }
}

/// `"9/2"` -> `"f/4.5"`
pub fn format_aperture(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return PLACEHOLDER.to_string();
    };
    if raw.starts_with("f/") {
        return raw.to_string();
    }
    match numeric_value(raw) {
        Some(value) => format!("f/{:.1}", value),
        None => raw.to_string(),
    }
}

pub fn format_iso(raw: Option<u32>) -> String {
    match raw {
        Some(iso) => format!("ISO {}", iso),
        None => PLACEHOLDER.to_string(),
    }
}

/// Rewrites decimal exposure times such as `"0.004"` as `"1/250"`.
/// Fractions and whole seconds pass through unchanged.
pub fn format_shutter_speed(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return PLACEHOLDER.to_string();
    };
    let Some(value) = parse_number(raw) else {
        return raw.to_string();
    };
    match whole_reciprocal(value) {
        Some(n) => format!("1/{}", n),
        None => raw.to_string(),
    }
}

/// `Some(n)` when a sub-second `value` is `1/n` up to float noise and `n`
/// fits in a `u64`
pub(crate) fn whole_reciprocal(value: f64) -> Option<u64> {
    if !(value > 0.0 && value < 1.0) {
        return None;
    }
    let reciprocal = 1.0 / value;
    let rounded = reciprocal.round();
    if (reciprocal - rounded).abs() < 1e-6 && rounded < u64::MAX as f64 {
        Some(rounded as u64)
    } else {
        None
    }
}

/// A `num/den` rational, or failing that a plain number
fn numeric_value(raw: &str) -> Option<f64> {
    if raw.contains('/') {
        if let Some(value) = parse_rational(raw) {
            return Some(value);
        }
    }
    parse_number(raw)
}

fn parse_rational(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num = parse_number(num)?;
    let den = parse_number(den)?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rounded value whose `Display` drops trailing zeros
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let rounded = (value * factor).round() / factor;
    // normalizes -0.0
    rounded + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focal_length() {
        assert_eq!(format_focal_length(None), "-");
        assert_eq!(format_focal_length(Some("50")), "50mm");
        assert_eq!(format_focal_length(Some("6249513/1000000")), "6.25mm");
        assert_eq!(format_focal_length(Some("24/1")), "24mm");
        assert_eq!(format_focal_length(Some("35/2")), "17.5mm");
    }

    #[test]
    fn test_focal_length_passthrough() {
        assert_eq!(format_focal_length(Some("24mm")), "24mm");
        assert_eq!(format_focal_length(Some("invalid")), "invalid");
        assert_eq!(format_focal_length(Some("24/0")), "24/0");
        assert_eq!(format_focal_length(Some("a/b")), "a/b");
        assert_eq!(format_focal_length(Some("1/2/3")), "1/2/3");
    }

    #[test]
    fn test_aperture() {
        assert_eq!(format_aperture(None), "-");
        assert_eq!(format_aperture(Some("9/2")), "f/4.5");
        assert_eq!(format_aperture(Some("8/1")), "f/8.0");
        assert_eq!(format_aperture(Some("2.8")), "f/2.8");
        assert_eq!(format_aperture(Some("f/1.4")), "f/1.4");
        assert_eq!(format_aperture(Some("18/0")), "18/0");
        assert_eq!(format_aperture(Some("wide open")), "wide open");
    }

    #[test]
    fn test_iso() {
        assert_eq!(format_iso(None), "-");
        assert_eq!(format_iso(Some(800)), "ISO 800");
    }

    #[test]
    fn test_shutter_speed() {
        assert_eq!(format_shutter_speed(None), "-");
        assert_eq!(format_shutter_speed(Some("0.004")), "1/250");
        assert_eq!(format_shutter_speed(Some("0.5")), "1/2");
        assert_eq!(format_shutter_speed(Some("1/250")), "1/250");
        assert_eq!(format_shutter_speed(Some("0.3")), "0.3");
        assert_eq!(format_shutter_speed(Some("2")), "2");
        assert_eq!(format_shutter_speed(Some("bulb")), "bulb");
    }

    #[test]
    fn test_formatters_never_panic_on_garbage() {
        let inputs = [
            "", "/", "//", "1/", "/1", "0/0", "-1/0", "NaN", "inf", "1e400", "-0", "mm", "f/",
            "   ", "½", "1/-0", "9999999999999999999999/1", "1e-300", "5e-324",
        ];
        for input in inputs {
            let _ = format_focal_length(Some(input));
            let _ = format_aperture(Some(input));
            let _ = format_shutter_speed(Some(input));
        }
        assert_eq!(format_focal_length(Some("NaN")), "NaN");
        assert_eq!(format_focal_length(Some("inf")), "inf");
        assert_eq!(format_focal_length(Some("-0")), "0mm");
        assert_eq!(format_shutter_speed(Some("1e-300")), "1e-300");
        assert_eq!(format_shutter_speed(Some("5e-324")), "5e-324");
    }

    #[test]
    fn test_whole_reciprocal_bounds() {
        assert_eq!(whole_reciprocal(0.004), Some(250));
        assert_eq!(whole_reciprocal(1.0 / 3.0), Some(3));
        assert_eq!(whole_reciprocal(0.8), None);
        assert_eq!(whole_reciprocal(1.0), None);
        assert!(whole_reciprocal(1e-19).is_some());
        assert_eq!(whole_reciprocal(1e-20), None);
    }
}
