//! The byte-range sub-protocol: formatting request ranges and parsing and
//! validating response ranges. Pure codecs, no I/O.

use ossify_common::{OssifyError, Result};

pub const HEADER_RANGE: &str = "Range";
pub const HEADER_CONTENT_RANGE: &str = "Content-Range";

/// A parsed `Content-Range` value.
///
/// `first == -1 && length == -1` is the unsatisfiable-range form
/// (`bytes */total`); `total == -1` means the server declined to state the
/// instance length (`bytes first-last/*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub first: i64,
    pub length: i64,
    pub total: i64,
}

/// Renders a `Range` header value.
///
/// `first >= 0, length > 0` selects `first..first+length`; `first >= 0,
/// length <= 0` is open-ended; `first < 0, length > 0` is the suffix form.
/// `first < 0, length <= 0` has no valid rendering and yields `None`: the
/// caller must not send a `Range` header.
pub fn format_range(first: i64, length: i64) -> Option<String> {
    let spec = if first < 0 {
        if length <= 0 {
            return None;
        }
        format!("-{length}")
    } else if length <= 0 {
        format!("{first}-")
    } else {
        format!("{first}-{}", first + length - 1)
    };
    Some(format!("bytes={spec}"))
}

/// Parses a `Content-Range` header value.
///
/// `ContentRangeInvalid` means the value could not be parsed at all;
/// `ContentRangeCorrupt` means it parsed but violates the logical
/// constraints (`last < first`, or a total that does not exceed `last`).
pub fn parse_content_range(value: &str) -> Result<ContentRange> {
    let rest = strip_bytes_prefix(value.trim()).ok_or(OssifyError::ContentRangeInvalid)?;

    if let Some(total) = rest.strip_prefix("*/") {
        let total = parse_non_negative(total)?;
        return Ok(ContentRange {
            first: -1,
            length: -1,
            total,
        });
    }

    let (span, total) = match rest.strip_suffix("/*") {
        Some(span) => (span, -1),
        None => {
            let idx = rest.rfind('/').ok_or(OssifyError::ContentRangeInvalid)?;
            (&rest[..idx], parse_non_negative(&rest[idx + 1..])?)
        }
    };

    let idx = span.find('-').ok_or(OssifyError::ContentRangeInvalid)?;
    let first = parse_non_negative(&span[..idx])?;
    let last = parse_non_negative(&span[idx + 1..])?;

    if last >= first && (total == -1 || total > last) {
        Ok(ContentRange {
            first,
            length: last - first + 1,
            total,
        })
    } else {
        Err(OssifyError::ContentRangeCorrupt)
    }
}

// Case-insensitive `bytes` unit followed by at least one whitespace
// character, e.g. `bytes 0-9/100`.
fn strip_bytes_prefix(value: &str) -> Option<&str> {
    if value.len() < 5 || !value[..5].eq_ignore_ascii_case("bytes") {
        return None;
    }
    let rest = &value[5..];
    if !rest.starts_with(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    Some(rest.trim_start())
}

fn parse_non_negative(value: &str) -> Result<i64> {
    match value.parse::<i64>() {
        Ok(parsed) if parsed >= 0 => Ok(parsed),
        _ => Err(OssifyError::ContentRangeInvalid),
    }
}
