use http::HeaderMap;
use percent_encoding::percent_decode_str;
use url::Url;

/// Header prefix selecting the provider headers that participate in signing.
pub const HEADER_PREFIX: &str = "x-oss-";

/// Query parameters that identify a sub-resource and therefore participate
/// in the canonicalized resource. The set is part of the server contract:
/// both sides must agree on it exactly, so it is fixed and exhaustive.
pub const SUBRESOURCES: &[&str] = &[
    "acl",
    "append",
    "cors",
    "delete",
    "group",
    "lifecycle",
    "link",
    "location",
    "logging",
    "objectInfo",
    "partNumber",
    "position",
    "qos",
    "referer",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "restore",
    "security-token",
    "uploadId",
    "uploads",
    "website",
];

/// Canonical form of the provider headers: `x-oss-` keys lowercased, first
/// value per key, sorted by key, rendered `key:value` and joined with `\n`.
/// Returns the empty string when no provider header is present.
pub fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut entries = Vec::new();
    for key in headers.keys() {
        let name = key.as_str();
        if !name.starts_with(HEADER_PREFIX) {
            continue;
        }
        let value = headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        entries.push((name.to_string(), value.to_string()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(key, value)| format!("{key}:{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canonical form of the addressed resource: `/`, the bucket name when the
/// host is virtual-host style (four dot-separated labels), the path, and the
/// sorted recognized sub-resource parameters. Parameters outside
/// [`SUBRESOURCES`] are excluded from signing.
pub fn canonicalized_resource(url: &Url) -> String {
    let mut out = String::from("/");

    if let Some(host) = url.host_str() {
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() == 4 {
            out.push_str(labels[0]);
            out.push('/');
        }
    }

    // The signature covers the decoded path; escaping is a transport
    // concern.
    let path = percent_decode_str(url.path()).decode_utf8_lossy();
    out.push_str(path.trim_start_matches('/'));

    let mut params: Vec<(String, String)> = Vec::new();
    for (key, value) in url.query_pairs() {
        if !SUBRESOURCES.contains(&key.as_ref()) {
            continue;
        }
        if params.iter().any(|(k, _)| k == key.as_ref()) {
            continue;
        }
        params.push((key.into_owned(), value.into_owned()));
    }
    if !params.is_empty() {
        params.sort_by(|a, b| a.0.cmp(&b.0));
        let rendered = params
            .into_iter()
            .map(|(key, value)| {
                if value.is_empty() {
                    key
                } else {
                    format!("{key}={value}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        out.push('?');
        out.push_str(&rendered);
    }

    out
}
