//! Fixture helpers shared by the unit tests

use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Build a minimal JPEG whose only content is an APP1 EXIF segment
/// carrying a DateTimeOriginal tag.
pub fn exif_jpeg(date_time_original: &str) -> Vec<u8> {
    // DateTimeOriginal is ASCII with a trailing NUL (20 bytes for a well-formed date)
    let mut date = date_time_original.as_bytes().to_vec();
    date.push(0);
    let count = date.len() as u32;

    // Little-endian TIFF: header, IFD0 (one entry: Exif IFD pointer),
    // Exif IFD (one entry: DateTimeOriginal), then the string itself.
    let ifd0_offset: u32 = 8;
    let exif_ifd_offset: u32 = ifd0_offset + 2 + 12 + 4;
    let date_offset: u32 = exif_ifd_offset + 2 + 12 + 4;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&ifd0_offset.to_le_bytes());

    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes()); // ExifIFDPointer
    tiff.extend_from_slice(&4u16.to_le_bytes()); // LONG
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&exif_ifd_offset.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes()); // DateTimeOriginal
    tiff.extend_from_slice(&2u16.to_le_bytes()); // ASCII
    tiff.extend_from_slice(&count.to_le_bytes());
    tiff.extend_from_slice(&date_offset.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(&date);

    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// Write a JPEG with an EXIF capture date
pub fn write_exif_photo(dir: &Path, name: &str, date_time_original: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, exif_jpeg(date_time_original)).unwrap();
    path
}

/// Write an image-named file without metadata, last modified in `year`
pub fn write_plain_photo(dir: &Path, name: &str, year: i32) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"no metadata here").unwrap();
    set_mtime_year(&path, year);
    path
}

/// Pin a file's modification time to mid-June of `year`, so the local-time
/// year is the same in every timezone.
pub fn set_mtime_year(path: &Path, year: i32) {
    let when = chrono::NaiveDate::from_ymd_opt(year, 6, 15)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .unwrap()
        .and_utc()
        .timestamp();
    filetime::set_file_mtime(path, FileTime::from_unix_time(when, 0)).unwrap();
}

/// Canonical form of a temp directory (resolves /tmp symlinks on some systems)
pub fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap()
}
