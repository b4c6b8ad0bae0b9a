//! Camera model name humanization.
//!
//! Sony bodies report internal identifiers such as `ILCE-7CM2` in the EXIF
//! `Model` tag. These are decoded into the marketing names photographers
//! recognize (`Sony α7C II`). Unrecognized models pass through untouched.

use std::sync::OnceLock;

use regex::Regex;

pub const UNKNOWN_CAMERA: &str = "Unknown Camera";

/// Models whose names do not follow the `ILCE-<base>M<gen>` scheme
const OVERRIDES: &[(&str, &str)] = &[
    ("ILCE-1", "Sony α1"),
    ("ILCE-1M2", "Sony α1 II"),
    ("ILCE-7RM3A", "Sony α7R IIIA"),
    ("ILCE-7RM4A", "Sony α7R IVA"),
    ("ILCE-QX1", "Sony QX1"),
    ("ILME-FX3", "Sony FX3"),
    ("ILME-FX30", "Sony FX30"),
    ("ILME-FX6V", "Sony FX6"),
    ("ZV-E1", "Sony ZV-E1"),
    ("ZV-E10", "Sony ZV-E10"),
    ("ZV-E10M2", "Sony ZV-E10 II"),
];

const ROMAN: [&str; 8] = ["", "", "II", "III", "IV", "V", "VI", "VII"];

fn model_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^ILCE-([0-9A-Z]+?)(?:M([0-9]+))?$").expect("model pattern is valid")
    })
}

/// Generation suffix: `2` -> `II`; generation 1 has none.
/// Numbers past the table are kept as digits.
fn generation_suffix(generation: &str) -> String {
    match generation.parse::<usize>() {
        Ok(n) if n < ROMAN.len() => ROMAN[n].to_string(),
        Ok(n) => n.to_string(),
        Err(_) => generation.to_string(),
    }
}

/// Turn an EXIF model identifier into a display name
pub fn humanize(model_id: Option<&str>) -> String {
    let Some(trimmed) = model_id.map(str::trim).filter(|m| !m.is_empty()) else {
        return UNKNOWN_CAMERA.to_string();
    };
    let normalized = trimmed.to_uppercase();

    if let Some((_, name)) = OVERRIDES.iter().find(|(id, _)| *id == normalized) {
        return (*name).to_string();
    }

    let Some(caps) = model_pattern().captures(&normalized) else {
        return trimmed.to_string();
    };

    let mut name = format!("Sony α{}", &caps[1]);
    if let Some(generation) = caps.get(2) {
        let suffix = generation_suffix(generation.as_str());
        if !suffix.is_empty() {
            name.push(' ');
            name.push_str(&suffix);
        }
    }
    name
}
