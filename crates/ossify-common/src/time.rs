use chrono::{DateTime, Utc};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Formats a timestamp as an RFC 7231 HTTP-date, e.g.
/// `Thu, 17 Nov 2005 18:49:58 GMT`.
pub fn http_date(dt: &DateTime<Utc>) -> String {
    dt.format(HTTP_DATE_FORMAT).to_string()
}

pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
