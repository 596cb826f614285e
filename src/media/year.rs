//! Capture year resolution
//!
//! The year a photo belongs to is taken from the EXIF DateTimeOriginal tag
//! when it is present and parseable, otherwise from the file's last-modified
//! time. Nothing in here returns an error: a file we cannot decode simply has
//! no capture date.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Format of EXIF date/time fields ("2021:06:01 10:00:00")
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Date/time layouts accepted when the exact EXIF format does not match.
/// Some cameras and editing tools write ISO-style or slash-separated dates.
const LENIENT_DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y:%m:%d %H:%M",
    "%Y:%m:%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

const LENIENT_DATE_FORMATS: [&str; 4] = ["%Y:%m:%d", "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Read the capture date embedded in an image file.
///
/// Returns `None` when the file cannot be opened, has no EXIF block,
/// has no DateTimeOriginal tag, or the tag does not hold a parseable date.
/// The file handle is dropped before this function returns on every path.
pub fn read_capture_date(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);

    let exif = Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;

    let raw = match &field.value {
        Value::Ascii(parts) => parts.first()?,
        _ => return None,
    };

    parse_capture_timestamp(&String::from_utf8_lossy(raw))
}

/// Parse a capture timestamp string.
///
/// The exact EXIF layout is tried first, then a set of common layouts.
/// Trailing NUL padding and surrounding whitespace are ignored.
pub fn parse_capture_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if text.is_empty() {
        return None;
    }

    if let Ok(taken) = NaiveDateTime::parse_from_str(text, EXIF_DATE_FORMAT) {
        return Some(taken);
    }

    parse_lenient(text)
}

fn parse_lenient(text: &str) -> Option<NaiveDateTime> {
    if let Ok(taken) = DateTime::parse_from_rfc3339(text) {
        return Some(taken.naive_local());
    }
    if let Ok(taken) = DateTime::parse_from_rfc2822(text) {
        return Some(taken.naive_local());
    }

    LENIENT_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            LENIENT_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Resolve the year a photo was taken.
///
/// Prefers the EXIF capture date; falls back to the local-time year of the
/// file's last modification. If even the file metadata is unreadable (the
/// file vanished mid-scan) the current year is used.
pub fn resolve_year(path: &Path) -> i32 {
    if let Some(taken) = read_capture_date(path) {
        return taken.year();
    }

    log::debug!("No capture date in {}, using modification time", path.display());

    modified_year(path).unwrap_or_else(|| {
        log::debug!("No modification time for {}, using current year", path.display());
        Local::now().year()
    })
}

fn modified_year(path: &Path) -> Option<i32> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).year())
}
