use http::header::{AUTHORIZATION, DATE};
use http::{HeaderMap, HeaderValue, Method};
use ossify_common::{OssifyError, Result, time};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::canonical::{canonicalized_headers, canonicalized_resource};
use crate::credentials::Credentials;
use crate::digest::hmac_sha1;

pub const SECURITY_TOKEN_HEADER: &str = "x-oss-security-token";

// Unreserved characters per RFC 3986; everything else is percent-encoded in
// the presigned query parameters.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The exact string both client and server sign:
/// `METHOD\nContent-MD5\nContent-Type\nDate-or-Expires\n[CanonicalizedHeaders\n]CanonicalizedResource`.
pub fn string_to_sign(
    method: &Method,
    headers: &HeaderMap,
    url: &Url,
    date_or_expires: &str,
) -> String {
    let mut parts = vec![
        method.as_str().to_string(),
        header_value(headers, "content-md5"),
        header_value(headers, "content-type"),
        date_or_expires.to_string(),
    ];
    let provider_headers = canonicalized_headers(headers);
    if !provider_headers.is_empty() {
        parts.push(provider_headers);
    }
    parts.push(canonicalized_resource(url));
    parts.join("\n")
}

/// Signs a built request in place.
///
/// `expires_in == 0` authenticates via the `Authorization` header;
/// `expires_in > 0` produces a presigned URL valid for that many seconds
/// past the request `Date`, prepending `OSSAccessKeyId`, `Expires` and
/// `Signature` to the query string.
///
/// A request must be signed exactly once: the routine mutates the headers or
/// the query, so a second invocation signs its own previous output.
pub fn sign_request(
    method: &Method,
    url: &mut Url,
    headers: &mut HeaderMap,
    credentials: &Credentials,
    expires_in: u64,
) -> Result<()> {
    if let Some(token) = &credentials.security_token {
        if expires_in > 0 {
            prepend_query(url, &format!("security-token={token}"));
        } else {
            headers.insert(SECURITY_TOKEN_HEADER, header_value_from(token)?);
        }
    }

    if !headers.contains_key(DATE) {
        headers.insert(DATE, header_value_from(&time::http_date(&time::now()))?);
    }

    let date_or_expires = if expires_in > 0 {
        let date = headers
            .get(DATE)
            .and_then(|value| value.to_str().ok())
            .and_then(time::parse_http_date);
        let date = match date {
            Some(date) => date,
            None => {
                let fallback = time::now();
                headers.insert(DATE, header_value_from(&time::http_date(&fallback))?);
                fallback
            }
        };
        (date.timestamp() + expires_in as i64).to_string()
    } else {
        header_value(headers, "date")
    };

    let signature = hmac_sha1(
        &credentials.access_key_secret,
        &string_to_sign(method, headers, url, &date_or_expires),
    );

    if expires_in > 0 {
        let prefix = format!(
            "OSSAccessKeyId={}&Expires={}&Signature={}",
            query_escape(&credentials.access_key_id),
            date_or_expires,
            query_escape(&signature),
        );
        prepend_query(url, &prefix);
    } else {
        let authorization = format!("OSS {}:{signature}", credentials.access_key_id);
        headers.insert(AUTHORIZATION, header_value_from(&authorization)?);
    }

    Ok(())
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn header_value_from(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|err| OssifyError::InvalidArgument(format!("header value: {err}")))
}

fn prepend_query(url: &mut Url, prefix: &str) {
    let combined = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{prefix}&{existing}"),
        _ => prefix.to_string(),
    };
    url.set_query(Some(&combined));
}

fn query_escape(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ESCAPE).to_string()
}
