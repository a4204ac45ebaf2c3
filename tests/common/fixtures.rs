//! Payload fixtures served by the mock HTTP server

/// PNG file signature
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// HTML error page as returned by a CDN for a missing object
pub const HTML_NOT_FOUND: &[u8] = b"<!DOCTYPE html>\n<html><head><title>404</title></head>\
<body>\r\nNot Found</body></html>";

/// PNG signature followed by filler up to `len` bytes
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.resize(len.max(PNG_SIGNATURE.len()), 0x5A);
    data
}

/// Minimal JPEG: SOI marker, a JFIF APP0 segment and filler up to `len` bytes
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    data.extend_from_slice(b"JFIF\0");
    data.resize(len.max(data.len()), 0x00);
    data
}

/// GIF89a header followed by filler up to `len` bytes
pub fn gif_bytes(len: usize) -> Vec<u8> {
    let mut data = b"GIF89a".to_vec();
    data.resize(len.max(data.len()), 0x01);
    data
}
