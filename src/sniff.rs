//! Content-based MIME detection.
//!
//! The type is decided from the leading bytes of the payload only. File
//! extensions and server-declared `Content-Type` headers are ignored, so the
//! same bytes always classify the same way.
//!
//! ## Recognised signatures
//!
//! | Offset | Bytes                      | Type                         |
//! |--------|----------------------------|------------------------------|
//! | 0      | `FF D8 FF`                 | `image/jpeg`                 |
//! | 0      | `89 50 4E 47`              | `image/png`                  |
//! | 0      | `GIF87a` / `GIF89a`        | `image/gif`                  |
//! | 0, 8   | `RIFF` .. `WEBP`           | `image/webp`                 |
//! | 0      | `BM` + DIB header size     | `image/bmp`                  |
//! | 0      | `II*\0` / `MM\0*`          | `image/tiff`                 |
//! | 0      | `00 00 01 00`              | `image/vnd.microsoft.icon`   |
//! | 4      | `ftyp` + brand             | `image/avif`, `image/heic`, `video/mp4` |
//! | 0      | `%PDF-`                    | `application/pdf`            |
//! | 0      | `PK 03 04`                 | `application/zip`            |
//! | 0      | `1F 8B`                    | `application/gzip`           |
//!
//! Anything else is inspected as text (HTML, SVG, XML, JSON, plain text) and
//! falls back to `application/octet-stream`.

use crate::types::ValidationResult;

/// MIME types accepted as images
///
/// `image/jpg` is not a registered type but is accepted as an alias for
/// compatibility with servers and tools that emit it.
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/jpg",
];

/// Length of the diagnostic preview shown for non-image payloads
pub const SNIPPET_LEN: usize = 200;

/// How far into a text payload markup is searched for
const TEXT_SCAN_LEN: usize = 1024;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = b"\x89PNG";
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const RIFF_MAGIC: &[u8] = b"RIFF";
const WEBP_FOURCC: &[u8] = b"WEBP";
const TIFF_LE_MAGIC: &[u8] = b"II*\0";
const TIFF_BE_MAGIC: &[u8] = b"MM\0*";
const ICO_MAGIC: &[u8] = &[0x00, 0x00, 0x01, 0x00];
const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// DIB header sizes that follow a `BM` file header
const BMP_DIB_SIZES: &[u32] = &[12, 40, 52, 56, 64, 108, 124];

/// Tags that mark a document as HTML when they open it
const HTML_OPENERS: &[&str] = &[
    "<!doctype html",
    "<html",
    "<head",
    "<body",
    "<title",
    "<script",
    "<style",
    "<div",
    "<p>",
    "<h1",
    "<br",
    "<table",
    "<iframe",
];

/// Detect the MIME type of `data` from its content
#[must_use]
pub fn sniff_mime(data: &[u8]) -> &'static str {
    if data.is_empty() {
        return "application/x-empty";
    }

    if let Some(mime) = sniff_binary(data) {
        return mime;
    }

    sniff_text(data)
}

/// Whether `mime` is one of [`ACCEPTED_IMAGE_TYPES`]
#[must_use]
pub fn is_accepted_image(mime: &str) -> bool {
    ACCEPTED_IMAGE_TYPES.contains(&mime)
}

/// Sniff `data` and classify it
#[must_use]
pub fn validate(data: &[u8]) -> ValidationResult {
    let mime = sniff_mime(data);
    ValidationResult {
        mime_type: mime.to_string(),
        is_image: is_accepted_image(mime),
    }
}

/// Preview of at most `max_len` leading bytes, safe for any report stream
///
/// Every byte outside printable ASCII (`0x20..=0x7E`) becomes `.`, so the
/// result has exactly one ASCII character per source byte.
///
/// # Examples
///
/// ```
/// use imgprobe::sniff::printable_snippet;
///
/// assert_eq!(printable_snippet(b"ok\r\n\x00end", 200), "ok...end");
/// assert_eq!(printable_snippet(b"abcdef", 3), "abc");
/// ```
#[must_use]
pub fn printable_snippet(data: &[u8], max_len: usize) -> String {
    data.iter()
        .take(max_len)
        .map(|&b| {
            if (0x20..=0x7E).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

fn sniff_binary(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(JPEG_MAGIC) {
        return Some("image/jpeg");
    }
    if data.starts_with(PNG_MAGIC) {
        return Some("image/png");
    }
    if data.starts_with(GIF87_MAGIC) || data.starts_with(GIF89_MAGIC) {
        return Some("image/gif");
    }
    if data.starts_with(RIFF_MAGIC) && data.get(8..12) == Some(WEBP_FOURCC) {
        return Some("image/webp");
    }
    if is_bmp(data) {
        return Some("image/bmp");
    }
    if data.starts_with(TIFF_LE_MAGIC) || data.starts_with(TIFF_BE_MAGIC) {
        return Some("image/tiff");
    }
    if data.starts_with(ICO_MAGIC) && data.len() >= 6 && data[4..6] != [0, 0] {
        return Some("image/vnd.microsoft.icon");
    }
    if let Some(mime) = sniff_iso_bmff(data) {
        return Some(mime);
    }
    if data.starts_with(PDF_MAGIC) {
        return Some("application/pdf");
    }
    if data.starts_with(ZIP_MAGIC) {
        return Some("application/zip");
    }
    if data.starts_with(GZIP_MAGIC) {
        return Some("application/gzip");
    }
    None
}

fn is_bmp(data: &[u8]) -> bool {
    if !data.starts_with(b"BM") || data.len() < 18 {
        return false;
    }
    let dib_size = u32::from_le_bytes([data[14], data[15], data[16], data[17]]);
    BMP_DIB_SIZES.contains(&dib_size)
}

/// ISO base media files (`....ftyp<brand>`)
fn sniff_iso_bmff(data: &[u8]) -> Option<&'static str> {
    if data.get(4..8) != Some(b"ftyp".as_slice()) {
        return None;
    }
    let brand = data.get(8..12)?;
    match brand {
        b"avif" | b"avis" => Some("image/avif"),
        b"heic" | b"heix" | b"mif1" | b"msf1" => Some("image/heic"),
        _ => Some("video/mp4"),
    }
}

fn sniff_text(data: &[u8]) -> &'static str {
    let body = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let head = &body[..body.len().min(TEXT_SCAN_LEN)];

    if !looks_like_text(head) {
        return "application/octet-stream";
    }

    let lower = String::from_utf8_lossy(head).to_ascii_lowercase();
    let trimmed = lower.trim_start();

    if trimmed.starts_with("<?xml") {
        if trimmed.contains("<svg") {
            return "image/svg+xml";
        }
        if trimmed.contains("<html") {
            return "text/html";
        }
        return "text/xml";
    }
    if trimmed.starts_with("<svg") {
        return "image/svg+xml";
    }
    if HTML_OPENERS.iter().any(|tag| trimmed.starts_with(tag))
        || (trimmed.starts_with("<!--") && trimmed.contains("<html"))
    {
        return "text/html";
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_slice::<serde_json::Value>(body).is_ok()
    {
        return "application/json";
    }
    "text/plain"
}

/// Text means valid UTF-8 (allowing a sequence cut at the scan boundary)
/// with no control bytes other than common whitespace and escape.
fn looks_like_text(head: &[u8]) -> bool {
    let valid = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    valid
        && head
            .iter()
            .all(|&b| b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\r' | 0x0C | 0x1B))
}
