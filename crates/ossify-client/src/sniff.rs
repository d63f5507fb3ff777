/// Content-type detection for materialized request bodies. Considers at most
/// the first 512 bytes, in the order: byte-order marks, markup signatures,
/// magic numbers, plain text, and finally `application/octet-stream`.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(512)];

    if data.starts_with(&[0xEF, 0xBB, 0xBF])
        || data.starts_with(&[0xFE, 0xFF])
        || data.starts_with(&[0xFF, 0xFE])
    {
        return "text/plain; charset=utf-8";
    }

    let trimmed = trim_markup_whitespace(data);
    if let Some(kind) = sniff_markup(trimmed) {
        return kind;
    }

    if let Some(kind) = sniff_magic(data) {
        return kind;
    }

    if looks_like_text(data) {
        return "text/plain; charset=utf-8";
    }

    "application/octet-stream"
}

fn trim_markup_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn sniff_markup(data: &[u8]) -> Option<&'static str> {
    const HTML_SIGNATURES: &[&[u8]] = &[
        b"<!DOCTYPE HTML",
        b"<HTML",
        b"<HEAD",
        b"<SCRIPT",
        b"<BODY",
        b"<IFRAME",
        b"<DIV",
        b"<P",
        b"<!--",
    ];
    for sig in HTML_SIGNATURES {
        if matches_tag(data, sig) {
            return Some("text/html; charset=utf-8");
        }
    }
    if data.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }
    None
}

// A markup signature must be followed by a tag terminator, so `<PRE>` does
// not sniff as `<P`.
fn matches_tag(data: &[u8], sig: &[u8]) -> bool {
    if data.len() <= sig.len() {
        return false;
    }
    data[..sig.len()].eq_ignore_ascii_case(sig) && matches!(data[sig.len()], b' ' | b'>')
}

fn sniff_magic(data: &[u8]) -> Option<&'static str> {
    const MAGICS: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xFF\xD8\xFF", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1F\x8B\x08", "application/x-gzip"),
    ];
    MAGICS
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|(_, kind)| *kind)
}

fn looks_like_text(data: &[u8]) -> bool {
    !data.iter().any(|&b| {
        b <= 0x08 || b == 0x0B || (0x0E..=0x1A).contains(&b) || (0x1C..=0x1F).contains(&b)
    })
}
