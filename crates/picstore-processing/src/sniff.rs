//! Content-type sniffing
//!
//! Classifies uploads by their leading bytes, never by filename or the
//! client-declared content type. The signature table follows the standard
//! MIME sniffing rules so rejected uploads report a familiar type string.

use picstore_core::constants::SNIFF_LEN;
use picstore_core::{AppError, ImageFormat};
use std::io::SeekFrom;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

const TEXT_UTF8: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Tags that mark a document as HTML when they open it (after whitespace),
/// matched case-insensitively and followed by a space or `>`.
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Determine the MIME type of `data` from at most its first 512 bytes.
///
/// Always returns a valid type; unrecognized binary content is
/// `application/octet-stream` and unrecognized text is `text/plain`.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(ct) = detect_bom(data) {
        return ct;
    }

    let trimmed = skip_whitespace(data);
    if is_html(trimmed) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if let Some(ct) = detect_binary_signature(data) {
        return ct;
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM
    } else {
        TEXT_UTF8
    }
}

fn detect_bom(data: &[u8]) -> Option<&'static str> {
    match data {
        [0xFE, 0xFF, ..] => Some("text/plain; charset=utf-16be"),
        [0xFF, 0xFE, ..] => Some("text/plain; charset=utf-16le"),
        [0xEF, 0xBB, 0xBF, ..] => Some(TEXT_UTF8),
        _ => None,
    }
}

fn detect_binary_signature(data: &[u8]) -> Option<&'static str> {
    let ct = match data {
        [b'%', b'P', b'D', b'F', b'-', ..] => "application/pdf",
        [b'%', b'!', b'P', b'S', b'-', b'A', b'd', b'o', b'b', b'e', b'-', ..] => {
            "application/postscript"
        }
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => "image/gif",
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'B', b'M', ..] => "image/bmp",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', b'V', b'P', ..] => {
            "image/webp"
        }
        [0x00, 0x00, 0x01, 0x00, ..] => "image/x-icon",
        [0x00, 0x00, 0x02, 0x00, ..] => "image/x-icon",
        [b'.', b's', b'n', b'd', ..] => "audio/basic",
        [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', b'F', ..] => "audio/aiff",
        [b'M', b'T', b'h', b'd', 0x00, 0x00, 0x00, 0x06, ..] => "audio/midi",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => "audio/wave",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'A', b'V', b'I', b' ', ..] => "video/avi",
        [b'O', b'g', b'g', b'S', 0x00, ..] => "application/ogg",
        [b'I', b'D', b'3', ..] => "audio/mpeg",
        [0x1A, 0x45, 0xDF, 0xA3, ..] => "video/webm",
        [_, _, _, _, b'f', b't', b'y', b'p', ..] if is_mp4(data) => "video/mp4",
        _ if data.get(34..36) == Some(&b"LP"[..]) => "application/vnd.ms-fontobject",
        [0x00, 0x01, 0x00, 0x00, ..] => "font/ttf",
        [b'O', b'T', b'T', b'O', ..] => "font/otf",
        [b't', b't', b'c', b'f', ..] => "font/collection",
        [b'w', b'O', b'F', b'F', ..] => "font/woff",
        [b'w', b'O', b'F', b'2', ..] => "font/woff2",
        [b'P', b'K', 0x03, 0x04, ..] => "application/zip",
        [0x1F, 0x8B, 0x08, ..] => "application/x-gzip",
        [b'R', b'a', b'r', b'!', 0x1A, 0x07, 0x00 | 0x01, ..] => "application/x-rar-compressed",
        [0x00, b'a', b's', b'm', ..] => "application/wasm",
        _ => return None,
    };
    Some(ct)
}

/// ISO base media box: the declared box size must fit the data and be 4-aligned,
/// and one of the brands must start with `mp4`.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if box_size % 4 != 0 || data.len() < box_size {
        return false;
    }
    (8..box_size)
        .step_by(4)
        .filter(|&i| i != 12)
        .any(|i| data.get(i..i + 3) == Some(b"mp4"))
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn is_html(data: &[u8]) -> bool {
    HTML_TAGS.iter().any(|tag| {
        data.len() > tag.len()
            && data[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(data[tag.len()], b' ' | b'>')
    })
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// Classify an upload as one of the accepted image formats.
///
/// Reads at most [`SNIFF_LEN`] bytes and seeks the reader back to its start,
/// so the caller can stream the full content afterwards.
pub async fn classify<R>(reader: &mut R) -> Result<ImageFormat, AppError>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    let mut buf = [0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader
            .read(&mut buf[filled..])
            .await
            .map_err(|e| AppError::Internal(format!("failed to read: {}", e)))?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    reader
        .seek(SeekFrom::Start(0))
        .await
        .map_err(|e| AppError::Internal(format!("failed to seek: {}", e)))?;

    let detected = detect_content_type(&buf[..filled]);
    tracing::debug!(content_type = detected, sniffed_bytes = filled, "Sniffed upload");

    ImageFormat::from_content_type(detected)
        .ok_or_else(|| AppError::BadType(format!("{} is not allowed", detected)))
}
