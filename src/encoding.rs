//! Character encoding detection and transcoding.
//!
//! Fetchers may hand over raw bytes. The charset is taken from, in order:
//! a byte order mark, an explicit label (HTTP `Content-Type` or manifest),
//! `<meta charset>`, `<meta http-equiv="Content-Type">`, and finally UTF-8.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

use crate::error::{Error, Result};

/// How many leading bytes are searched for a meta declaration.
const SNIFF_BYTES: usize = 1024;

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>/;]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// `charset=` parameter of a `Content-Type` header value.
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

/// Detect the encoding of HTML bytes from a BOM or a meta declaration,
/// defaulting to UTF-8.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(html) {
        return encoding;
    }

    let head = String::from_utf8_lossy(&html[..html.len().min(SNIFF_BYTES)]);
    capture(&CHARSET_META_RE, &head)
        .or_else(|| capture(&CONTENT_TYPE_CHARSET_RE, &head))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Transcode HTML bytes to a UTF-8 string.
///
/// Invalid sequences become U+FFFD; this never fails.
///
/// # Examples
///
/// ```
/// use rs_harvest::encoding::transcode_to_utf8;
///
/// let html = b"<html><body>Hello, World!</body></html>";
/// assert!(transcode_to_utf8(html).contains("Hello, World!"));
/// ```
#[must_use]
pub fn transcode_to_utf8(html: &[u8]) -> String {
    let encoding = detect_encoding(html);
    // `decode` strips a BOM matching the detected encoding.
    let (decoded, _, _) = encoding.decode(html);
    decoded.into_owned()
}

/// Transcode using a `Content-Type` header value when it names a charset.
/// A BOM still takes precedence.
#[must_use]
pub fn transcode_with_content_type(html: &[u8], content_type: Option<&str>) -> String {
    let from_header = content_type
        .and_then(|ct| capture(&HEADER_CHARSET_RE, ct))
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    match (Encoding::for_bom(html), from_header) {
        (None, Some(encoding)) => encoding.decode(html).0.into_owned(),
        _ => transcode_to_utf8(html),
    }
}

/// Decode with an explicitly named charset.
///
/// Unlike detection, an unknown label is an error rather than a silent
/// fallback to UTF-8.
pub fn decode_with_label(html: &[u8], label: &str) -> Result<String> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::EncodingError(format!("unknown charset label: {label}")))?;
    Ok(encoding.decode(html).0.into_owned())
}
