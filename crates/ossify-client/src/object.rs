//! Object handle and object-level operations.

use http::header::{ETAG, HeaderName, RANGE};
use http::{HeaderMap, Method, StatusCode};
use ossify_common::{OssifyError, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::client::Client;
use crate::decode::{Sink, read_body};
use crate::naming::full_resource_name;
use crate::range::{ContentRange, format_range, parse_content_range};
use crate::request::{Body, CallOptions, header_value};

pub(crate) const OBJECT_ACL_HEADER: HeaderName = HeaderName::from_static("x-oss-object-acl");
pub(crate) const COPY_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-oss-copy-source");
const NEXT_APPEND_POSITION_HEADER: &str = "x-oss-next-append-position";
const HASH_CRC64_HEADER: &str = "x-oss-hash-crc64ecma";

/// An object of a bucket. Carries the client reference plus the bucket and
/// key names; every operation passes both explicitly into the request
/// builder.
pub struct Object<'a> {
    client: &'a Client,
    bucket: String,
    key: String,
}

/// Result of an append: where the next append must start, the CRC-64-ECMA of
/// the whole object so far, and the ETag.
#[derive(Debug, Clone)]
pub struct AppendInfo {
    pub next_position: u64,
    pub crc64: String,
    pub etag: String,
}

impl<'a> Object<'a> {
    pub(crate) fn new(
        client: &'a Client,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `/bucket/key`, or `None` when either name is invalid. The `None`
    /// sentinel marks an object that must not be referenced by copy
    /// operations.
    pub fn full_name(&self) -> Option<String> {
        full_resource_name(&self.bucket, &self.key)
    }

    fn guard(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(OssifyError::BucketNameRequired);
        }
        if self.key.is_empty() {
            return Err(OssifyError::ObjectNameRequired);
        }
        Ok(())
    }

    pub(crate) async fn get_response(
        &self,
        method: Method,
        body: Body,
        opts: &CallOptions,
    ) -> Result<reqwest::Response> {
        self.guard()?;
        self.client
            .get_response(method, Some(&self.bucket), Some(&self.key), body, opts)
            .await
    }

    pub(crate) async fn do_request(
        &self,
        method: Method,
        body: Body,
        opts: &CallOptions,
        sink: Sink<'_>,
    ) -> Result<u64> {
        self.guard()?;
        self.client
            .do_request(method, Some(&self.bucket), Some(&self.key), body, opts, sink)
            .await
    }

    pub(crate) async fn do_request_xml<T: DeserializeOwned>(
        &self,
        method: Method,
        body: Body,
        opts: &CallOptions,
    ) -> Result<T> {
        self.guard()?;
        self.client
            .do_request_xml(method, Some(&self.bucket), Some(&self.key), body, opts)
            .await
    }

    /// Uploads `data` as the object content and returns the ETag. Only byte
    /// and stream shapes are accepted.
    pub async fn put(&self, data: Body, acl: Option<&str>, opts: CallOptions) -> Result<String> {
        if !data.is_upload_data() {
            return Err(OssifyError::UnsupportedDataType);
        }
        let mut opts = opts;
        if let Some(acl) = acl {
            opts = opts.with_header(OBJECT_ACL_HEADER, header_value(acl)?);
        }
        let response = self.get_response(Method::PUT, data, &opts).await?;
        let etag = response_header(&response, ETAG.as_str());
        read_body(response, Sink::Discard).await?;
        Ok(etag)
    }

    /// Downloads the object content into `sink` and returns the byte count.
    /// Only byte, file and writer sinks are accepted.
    pub async fn get(&self, sink: Sink<'_>, opts: CallOptions) -> Result<u64> {
        if !sink.is_download_target() {
            return Err(OssifyError::UnsupportedDataType);
        }
        self.do_request(Method::GET, Body::None, &opts, sink).await
    }

    /// Downloads a byte range into `sink`, validating the response range
    /// against the request.
    ///
    /// The returned value is the parsed `Content-Range`. Any disagreement
    /// between the requested range, the response range and the bytes
    /// actually read fails with `ContentRangeCorrupt`; on error the sink
    /// contents are unspecified.
    pub async fn get_range(
        &self,
        first: i64,
        length: i64,
        sink: Sink<'_>,
        opts: CallOptions,
    ) -> Result<ContentRange> {
        if !sink.is_download_target() {
            return Err(OssifyError::UnsupportedDataType);
        }
        let range = format_range(first, length)
            .ok_or_else(|| OssifyError::InvalidArgument("range".to_string()))?;
        let opts = opts.with_header(RANGE, header_value(&range)?);

        let response = self.get_response(Method::GET, Body::None, &opts).await?;
        let status = response.status();
        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let read = read_body(response, sink).await?;
        check_range_response(first, length, status, content_range.as_deref(), read)
    }

    /// Copies the content of `source` into this object.
    pub async fn copy(
        &self,
        source: &Object<'_>,
        acl: Option<&str>,
        opts: CallOptions,
    ) -> Result<CopyObjectResult> {
        let source_name = source.full_name().ok_or(OssifyError::InvalidSourceObject)?;
        let mut opts = opts.with_header(COPY_SOURCE_HEADER, header_value(&source_name)?);
        if let Some(acl) = acl {
            opts = opts.with_header(OBJECT_ACL_HEADER, header_value(acl)?);
        }
        self.do_request_xml(Method::PUT, Body::None, &opts).await
    }

    /// Appends `data` at `position`. The object must be appendable; the
    /// service answers `ObjectNotAppendable` otherwise.
    pub async fn append(
        &self,
        position: u64,
        data: Body,
        acl: Option<&str>,
        opts: CallOptions,
    ) -> Result<AppendInfo> {
        if !data.is_upload_data() {
            return Err(OssifyError::UnsupportedDataType);
        }
        let mut opts = opts
            .with_query("append", "")
            .with_query("position", position.to_string());
        if let Some(acl) = acl {
            opts = opts.with_header(OBJECT_ACL_HEADER, header_value(acl)?);
        }

        let response = self.get_response(Method::POST, data, &opts).await?;
        let next = response_header(&response, NEXT_APPEND_POSITION_HEADER);
        let crc64 = response_header(&response, HASH_CRC64_HEADER);
        let etag = response_header(&response, ETAG.as_str());
        read_body(response, Sink::Discard).await?;

        let next_position = next
            .parse()
            .map_err(|_| OssifyError::Decode(format!("next append position: {next:?}")))?;
        Ok(AppendInfo {
            next_position,
            crc64,
            etag,
        })
    }

    pub async fn delete(&self, opts: CallOptions) -> Result<()> {
        self.do_request(Method::DELETE, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// Fetches the object metadata; the interesting values are the returned
    /// headers.
    pub async fn head(&self, opts: CallOptions) -> Result<HeaderMap> {
        let response = self.get_response(Method::HEAD, Body::None, &opts).await?;
        let headers = response.headers().clone();
        read_body(response, Sink::Discard).await?;
        Ok(headers)
    }

    pub async fn put_acl(&self, acl: &str, opts: CallOptions) -> Result<()> {
        let opts = opts
            .with_header(OBJECT_ACL_HEADER, header_value(acl)?)
            .with_query("acl", "");
        self.do_request(Method::PUT, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// The object ACL; `default` when none has been set explicitly.
    pub async fn get_acl(&self, opts: CallOptions) -> Result<String> {
        let opts = opts.with_query("acl", "");
        let policy: crate::bucket::AccessControlPolicy =
            self.do_request_xml(Method::GET, Body::None, &opts).await?;
        Ok(policy.access_control_list.grant)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CopyObjectResult {
    #[serde(rename = "LastModified", default)]
    pub last_modified: String,
    #[serde(rename = "ETag", default)]
    pub etag: String,
}

/// Validates a ranged response against the request: the returned range must
/// start where asked, must not exceed the requested length, and must match
/// the bytes actually read. A server free to ignore `Range` may answer 200
/// with the whole body, acceptable only for a request that started at zero.
fn check_range_response(
    first: i64,
    length: i64,
    status: StatusCode,
    content_range: Option<&str>,
    read: u64,
) -> Result<ContentRange> {
    let Some(value) = content_range else {
        if first == 0 && status == StatusCode::OK {
            return Ok(ContentRange {
                first: 0,
                length: read as i64,
                total: read as i64,
            });
        }
        return Err(OssifyError::ContentRangeCorrupt);
    };

    let parsed = parse_content_range(value)?;
    if first >= 0 && parsed.first != first {
        return Err(OssifyError::ContentRangeCorrupt);
    }
    if length > 0 && parsed.length > length {
        return Err(OssifyError::ContentRangeCorrupt);
    }
    if read as i64 != parsed.length {
        return Err(OssifyError::ContentRangeCorrupt);
    }
    Ok(parsed)
}

pub(crate) fn response_header(response: &reqwest::Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}
