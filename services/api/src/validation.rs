//! Input validation utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Image MIME types accepted for events and venues
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Categories a venue can be filed under
pub const VENUE_CATEGORIES: [&str; 11] = [
    "Рестораны",
    "Кафе",
    "Бары",
    "Клубы",
    "Музеи",
    "Театры",
    "Магазины",
    "Спорт",
    "Развлечения",
    "Красота",
    "Другое",
];

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_ADDRESS_CHARS: usize = 300;
pub const MAX_VENUE_IMAGES: usize = 10;

/// Trimmed required text field bounded by `max_chars`
pub fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String, String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(format!("{} is required", field));
    }

    if value.chars().count() > max_chars {
        return Err(format!(
            "{} must be at most {} characters long",
            field, max_chars
        ));
    }

    Ok(value.to_string())
}

/// Trimmed optional text field; blank becomes `None`
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => required_text(field, value, max_chars).map(Some),
    }
}

/// Parse a client timestamp
///
/// Accepts RFC 3339, a `datetime-local` value (`YYYY-MM-DDTHH:MM[:SS]`, read
/// as UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(format!("{} is required", field));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("{} is not a valid date", field))
}

/// Validate an optional `HH:MM` time of day
pub fn validate_time(time: Option<&str>) -> Result<Option<String>, String> {
    let time = match time.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(time) => time,
    };

    static TIME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TIME_REGEX.get_or_init(|| {
        Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("Failed to compile time regex")
    });

    if !regex.is_match(time) {
        return Err("Time must be in HH:MM format".to_string());
    }

    Ok(Some(time.to_string()))
}

/// Validate an image MIME type
pub fn validate_image_type(image_type: &str) -> Result<(), String> {
    if ALLOWED_IMAGE_TYPES.contains(&image_type) {
        Ok(())
    } else {
        Err(format!(
            "Unsupported image type {}; allowed: {}",
            image_type,
            ALLOWED_IMAGE_TYPES.join(", ")
        ))
    }
}

/// Validate an optional image with its MIME type
///
/// A blank image drops both fields; a present image needs a supported type.
pub fn validate_image(
    image: Option<&str>,
    image_type: Option<&str>,
) -> Result<(Option<String>, Option<String>), String> {
    let image = match image.map(str::trim) {
        None | Some("") => return Ok((None, None)),
        Some(image) => image,
    };

    let image_type = image_type
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Image type is required when an image is attached".to_string())?;

    validate_image_type(image_type)?;

    Ok((Some(image.to_string()), Some(image_type.to_string())))
}

/// Validate venue images and their MIME types, index by index
pub fn validate_venue_images(images: &[String], image_types: &[String]) -> Result<(), String> {
    if images.len() > MAX_VENUE_IMAGES {
        return Err(format!("At most {} images are allowed", MAX_VENUE_IMAGES));
    }

    if images.len() != image_types.len() {
        return Err("Each image needs exactly one image type".to_string());
    }

    if images.iter().any(|image| image.trim().is_empty()) {
        return Err("Images must not be empty".to_string());
    }

    image_types
        .iter()
        .try_for_each(|image_type| validate_image_type(image_type))
}

/// Validate a venue category
pub fn validate_venue_category(category: &str) -> Result<String, String> {
    let category = required_text("Category", category, 100)?;

    if !VENUE_CATEGORIES.contains(&category.as_str()) {
        return Err(format!("Unknown venue category: {}", category));
    }

    Ok(category)
}

/// Validate and trim message content
pub fn validate_message(content: &str, max_chars: usize) -> Result<String, String> {
    let content = content.trim();

    if content.is_empty() {
        return Err("Message must not be empty".to_string());
    }

    if content.chars().count() > max_chars {
        return Err(format!(
            "Message must be at most {} characters long",
            max_chars
        ));
    }

    Ok(content.to_string())
}
