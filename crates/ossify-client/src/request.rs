//! Request assembly: body shapes, header/query overrides and the builder
//! that turns an operation into an unsigned wire request.

use bytes::Bytes;
use http::header::{
    ACCEPT_ENCODING, CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HeaderName, USER_AGENT,
};
use http::{HeaderMap, HeaderValue, Method};
use ossify_common::{OssifyError, Result};
use serde::Serialize;
use tokio::fs::File;
use url::Url;

use crate::client::Client;
use crate::naming::{is_bucket_name, is_object_name};
use crate::sniff::detect_content_type;

const USER_AGENT_VALUE: &str = concat!("ossify/", env!("CARGO_PKG_VERSION"));
const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

/// A request body, decided once at the call boundary.
///
/// `Bytes` and `Xml` are materialized and get `Content-Type`/`Content-MD5`
/// headers computed from their bytes. `File` is streamed with its length
/// taken from the file metadata and carries no content headers: computing
/// them would mean buffering the whole stream.
pub enum Body {
    None,
    Bytes(Bytes),
    File(File),
    Xml(String),
}

impl Body {
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Body::Bytes(data.into())
    }

    pub fn file(file: File) -> Self {
        Body::File(file)
    }

    /// Serializes `value` as an XML document body.
    pub fn xml<T: Serialize>(value: &T) -> Result<Self> {
        quick_xml::se::to_string(value)
            .map(Body::Xml)
            .map_err(|err| OssifyError::Serialize(err.to_string()))
    }

    /// Whether this shape is accepted by the upload operations (put, append,
    /// upload part): exact bytes or a sized stream.
    pub(crate) fn is_upload_data(&self) -> bool {
        matches!(self, Body::Bytes(_) | Body::File(_))
    }
}

/// Per-call header and query overrides. Both default to empty; operations
/// merge their own entries on top.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(String, String)>>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.get_or_insert_with(HeaderMap::new).insert(name, value);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }
}

/// An unsigned request: built once, mutated in place by the signature
/// engine, then handed to the transport. Never reuse one across signings;
/// each signature is tied to one `Date` or expiry value.
#[derive(Debug)]
pub struct OssRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub content_length: Option<u64>,
}

#[derive(Debug)]
pub enum RequestBody {
    None,
    Bytes(Bytes),
    File(File),
}

impl Client {
    /// Assembles an unsigned request for an operation.
    ///
    /// The bucket name, when given, becomes a subdomain of the service host;
    /// the object key becomes the URL path. Query pairs are sorted by key
    /// and percent-encoded. The identifying defaults (`User-Agent`,
    /// `Connection`, `Accept-Encoding`, `Cache-Control`) are only set when
    /// the caller did not supply them.
    pub async fn build_request(
        &self,
        method: Method,
        bucket: Option<&str>,
        object: Option<&str>,
        body: Body,
        opts: &CallOptions,
    ) -> Result<OssRequest> {
        if self.credentials().is_empty() {
            return Err(OssifyError::CredentialsRequired);
        }

        let mut headers = opts.headers.clone().unwrap_or_default();
        let mut query = opts.query.clone().unwrap_or_default();

        let mut host = self.host();
        if let Some(bucket) = bucket {
            if !is_bucket_name(bucket) {
                return Err(OssifyError::InvalidBucketName(bucket.to_string()));
            }
            host = format!("{bucket}.{host}");
        }

        let mut url = Url::parse(&format!("{}://{host}/", self.scheme()))
            .map_err(|err| OssifyError::InvalidArgument(format!("endpoint url: {err}")))?;

        if let Some(object) = object {
            if !is_object_name(object) {
                return Err(OssifyError::InvalidObjectName(object.to_string()));
            }
            url.set_path(&format!("/{object}"));
        }

        if !query.is_empty() {
            query.sort_by(|a, b| a.0.cmp(&b.0));
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        default_header(&mut headers, USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_header(&mut headers, CONNECTION, HeaderValue::from_static("keep-alive"));
        default_header(
            &mut headers,
            ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );
        default_header(&mut headers, CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let (body, content_length) = match body {
            Body::None => (RequestBody::None, None),
            Body::Bytes(data) => {
                set_content_headers(&mut headers, &data)?;
                let len = data.len() as u64;
                (RequestBody::Bytes(data), Some(len))
            }
            Body::Xml(text) => {
                let data = Bytes::from(text);
                set_content_headers(&mut headers, &data)?;
                let len = data.len() as u64;
                (RequestBody::Bytes(data), Some(len))
            }
            Body::File(file) => {
                let len = file.metadata().await?.len();
                (RequestBody::File(file), Some(len))
            }
        };

        Ok(OssRequest {
            method,
            url,
            headers,
            body,
            content_length,
        })
    }
}

fn default_header(headers: &mut HeaderMap, name: HeaderName, value: HeaderValue) {
    headers.entry(name).or_insert(value);
}

fn set_content_headers(headers: &mut HeaderMap, data: &[u8]) -> Result<()> {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(detect_content_type(data)));
    headers.insert(CONTENT_MD5, header_value(&ossify_sign::md5_base64(data))?);
    Ok(())
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|err| OssifyError::InvalidArgument(format!("header value: {err}")))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::client::Config;
    use crate::naming::LOCATION_CN_HANGZHOU;
    use crate::naming::endpoint_domain;

    fn test_client() -> Client {
        Client::with_config(Config {
            credentials: ossify_sign::Credentials::new("id", "secret"),
            domain: Some(endpoint_domain(LOCATION_CN_HANGZHOU, false)),
            insecure: false,
        })
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected() {
        let client = Client::new("", "");
        let err = client
            .build_request(Method::GET, None, None, Body::None, &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OssifyError::CredentialsRequired));
    }

    #[tokio::test]
    async fn builds_virtual_host_url_and_defaults() {
        let client = test_client();
        let request = client
            .build_request(
                Method::GET,
                Some("bucket"),
                Some("dir/key"),
                Body::None,
                &CallOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://bucket.oss-cn-hangzhou.aliyuncs.com/dir/key"
        );
        assert_eq!(request.headers.get(USER_AGENT).unwrap(), USER_AGENT_VALUE);
        assert_eq!(request.headers.get(CONNECTION).unwrap(), "keep-alive");
        assert_eq!(request.headers.get(ACCEPT_ENCODING).unwrap(), "gzip, deflate");
        assert_eq!(request.headers.get(CACHE_CONTROL).unwrap(), "no-cache");
        assert!(request.content_length.is_none());
    }

    #[tokio::test]
    async fn caller_headers_win_over_defaults() {
        let client = test_client();
        let opts = CallOptions::new()
            .with_header(USER_AGENT, HeaderValue::from_static("custom-agent"));
        let request = client
            .build_request(Method::GET, None, None, Body::None, &opts)
            .await
            .unwrap();
        assert_eq!(request.headers.get(USER_AGENT).unwrap(), "custom-agent");
    }

    #[tokio::test]
    async fn invalid_names_are_rejected() {
        let client = test_client();
        let err = client
            .build_request(Method::GET, Some("XY"), None, Body::None, &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OssifyError::InvalidBucketName(_)));

        let err = client
            .build_request(
                Method::GET,
                Some("bucket"),
                Some("/bad"),
                Body::None,
                &CallOptions::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, OssifyError::InvalidObjectName(_)));
    }

    #[tokio::test]
    async fn byte_bodies_get_content_headers() {
        let client = test_client();
        let request = client
            .build_request(
                Method::PUT,
                Some("bucket"),
                Some("key"),
                Body::bytes(&b"hello world"[..]),
                &CallOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            request.headers.get("content-md5").unwrap().to_str().unwrap(),
            ossify_sign::md5_base64(b"hello world")
        );
        assert_eq!(request.content_length, Some(11));
        assert!(matches!(request.body, RequestBody::Bytes(_)));
    }

    #[tokio::test]
    async fn query_pairs_are_sorted_and_encoded() {
        let client = test_client();
        let opts = CallOptions::new()
            .with_query("uploads", "")
            .with_query("acl", "")
            .with_query("max-keys", "10");
        let request = client
            .build_request(Method::GET, Some("bucket"), None, Body::None, &opts)
            .await
            .unwrap();
        assert_eq!(request.url.query(), Some("acl=&max-keys=10&uploads="));
    }

    #[tokio::test]
    async fn xml_bodies_are_serialized() {
        #[derive(Serialize)]
        #[serde(rename = "CreateBucketConfiguration")]
        struct Cfg {
            #[serde(rename = "LocationConstraint")]
            location_constraint: String,
        }

        let client = test_client();
        let body = Body::xml(&Cfg {
            location_constraint: "oss-cn-hangzhou".to_string(),
        })
        .unwrap();
        let request = client
            .build_request(Method::PUT, Some("bucket"), None, body, &CallOptions::new())
            .await
            .unwrap();

        let RequestBody::Bytes(data) = request.body else {
            panic!("expected a materialized body");
        };
        assert_eq!(
            data.as_ref(),
            b"<CreateBucketConfiguration><LocationConstraint>oss-cn-hangzhou</LocationConstraint></CreateBucketConfiguration>"
        );
        assert!(request.headers.contains_key("content-md5"));
    }
}
