//! The service client: configuration, signing, transport dispatch and the
//! service-level operations.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use http::header::CONTENT_LENGTH;
use ossify_common::{OssifyError, Result};
use ossify_sign::{Credentials, sign_request};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::bucket::{Bucket, Owner};
use crate::decode::{Sink, read_body, read_xml};
use crate::naming::endpoint_domain;
use crate::object::Object;
use crate::request::{Body, CallOptions, OssRequest, RequestBody};

/// Client configuration. Immutable once the client is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Host override; the default access domain is used when absent.
    pub domain: Option<String>,
    /// Use plain HTTP instead of HTTPS.
    pub insecure: bool,
}

impl Config {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(access_key_id, access_key_secret),
            domain: None,
            insecure: false,
        }
    }
}

/// Injectable delay applied before each dispatch. The default does nothing;
/// tests substitute one to exercise slow-transport behavior.
#[async_trait]
pub trait RequestPacer: Send + Sync {
    async fn pause(&self);
}

struct NoPacing;

#[async_trait]
impl RequestPacer for NoPacing {
    async fn pause(&self) {}
}

/// An object-storage service client.
///
/// Stateless apart from the connection pool: every operation is an
/// independent build, sign, send, decode sequence, so one client may be
/// shared freely across tasks.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
    pacer: Arc<dyn RequestPacer>,
}

impl Client {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self::with_config(Config::new(access_key_id, access_key_secret))
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            pacer: Arc::new(NoPacing),
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn RequestPacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.config.credentials
    }

    pub fn scheme(&self) -> &'static str {
        if self.config.insecure { "http" } else { "https" }
    }

    pub fn host(&self) -> String {
        self.config
            .domain
            .clone()
            .unwrap_or_else(|| endpoint_domain("", false))
    }

    pub fn bucket(&self, name: impl Into<String>) -> Bucket<'_> {
        Bucket::new(self, name)
    }

    pub fn object(&self, bucket: impl Into<String>, key: impl Into<String>) -> Object<'_> {
        Object::new(self, bucket, key)
    }

    /// Signs a built request in place. `expires_in == 0` sets the
    /// `Authorization` header; a positive value turns the URL into a
    /// presigned one. Sign a request exactly once, immediately before
    /// dispatch.
    pub fn sign(&self, request: &mut OssRequest, expires_in: u64) -> Result<()> {
        sign_request(
            &request.method,
            &mut request.url,
            &mut request.headers,
            self.credentials(),
            expires_in,
        )
    }

    /// Builds and signs a presigned URL valid for `expires_in` seconds.
    pub async fn presigned_url(
        &self,
        method: Method,
        bucket: Option<&str>,
        object: Option<&str>,
        expires_in: u64,
        opts: &CallOptions,
    ) -> Result<Url> {
        let mut request = self
            .build_request(method, bucket, object, Body::None, opts)
            .await?;
        self.sign(&mut request, expires_in)?;
        Ok(request.url)
    }

    /// Builds, signs and dispatches a request, returning the raw response.
    pub async fn get_response(
        &self,
        method: Method,
        bucket: Option<&str>,
        object: Option<&str>,
        body: Body,
        opts: &CallOptions,
    ) -> Result<reqwest::Response> {
        self.pacer.pause().await;
        let mut request = self.build_request(method, bucket, object, body, opts).await?;
        self.sign(&mut request, 0)?;
        self.dispatch(request).await
    }

    /// Full operation round trip with the body routed into `sink`.
    pub async fn do_request(
        &self,
        method: Method,
        bucket: Option<&str>,
        object: Option<&str>,
        body: Body,
        opts: &CallOptions,
        sink: Sink<'_>,
    ) -> Result<u64> {
        let response = self.get_response(method, bucket, object, body, opts).await?;
        read_body(response, sink).await
    }

    /// Full operation round trip with the body XML-decoded into `T`.
    pub async fn do_request_xml<T: DeserializeOwned>(
        &self,
        method: Method,
        bucket: Option<&str>,
        object: Option<&str>,
        body: Body,
        opts: &CallOptions,
    ) -> Result<T> {
        let response = self.get_response(method, bucket, object, body, opts).await?;
        read_xml(response).await
    }

    async fn dispatch(&self, request: OssRequest) -> Result<reqwest::Response> {
        debug!(method = %request.method, url = %request.url, "dispatching request");
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        match request.body {
            RequestBody::None => {}
            RequestBody::Bytes(data) => builder = builder.body(data),
            RequestBody::File(file) => {
                if let Some(len) = request.content_length {
                    builder = builder.header(CONTENT_LENGTH, len);
                }
                builder = builder.body(reqwest::Body::wrap_stream(ReaderStream::new(file)));
            }
        }
        builder
            .send()
            .await
            .map_err(|err| OssifyError::Transport(err.to_string()))
    }

    /// Lists all buckets of the account. Recognized query parameters:
    /// `prefix`, `marker`, `max-keys`.
    pub async fn list_buckets(&self, opts: CallOptions) -> Result<ListAllMyBucketsResult> {
        self.do_request_xml(Method::GET, None, None, Body::None, &opts)
            .await
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAllMyBucketsResult {
    #[serde(rename = "Prefix", default)]
    pub prefix: String,
    #[serde(rename = "Marker", default)]
    pub marker: String,
    #[serde(rename = "MaxKeys", default)]
    pub max_keys: String,
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "NextMarker", default)]
    pub next_marker: String,
    #[serde(rename = "Owner", default)]
    pub owner: Owner,
    #[serde(rename = "Buckets", default)]
    pub buckets: Buckets,
}

#[derive(Debug, Default, Deserialize)]
pub struct Buckets {
    #[serde(rename = "Bucket", default)]
    pub bucket: Vec<BucketSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BucketSummary {
    #[serde(rename = "Location", default)]
    pub location: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "CreationDate", default)]
    pub creation_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_follows_the_insecure_flag() {
        let client = Client::new("id", "secret");
        assert_eq!(client.scheme(), "https");
        assert_eq!(client.host(), "oss.aliyuncs.com");

        let mut config = Config::new("id", "secret");
        config.insecure = true;
        config.domain = Some("storage.example.com".to_string());
        let client = Client::with_config(config);
        assert_eq!(client.scheme(), "http");
        assert_eq!(client.host(), "storage.example.com");
    }

    #[tokio::test]
    async fn presigned_url_carries_the_signature_query() {
        let client = Client::new("id", "secret");
        let url = client
            .presigned_url(
                Method::GET,
                Some("bucket"),
                Some("key"),
                60,
                &CallOptions::new(),
            )
            .await
            .unwrap();
        let query = url.query().unwrap();
        assert!(query.starts_with("OSSAccessKeyId=id&Expires="));
        assert!(query.contains("&Signature="));
    }

    #[test]
    fn list_all_my_buckets_result_decodes() {
        let xml = r#"<ListAllMyBucketsResult>
  <Owner><ID>12345</ID><DisplayName>user</DisplayName></Owner>
  <Buckets>
    <Bucket><Location>oss-cn-hangzhou</Location><Name>first</Name><CreationDate>2026-01-01T00:00:00.000Z</CreationDate></Bucket>
    <Bucket><Location>oss-cn-beijing</Location><Name>second</Name><CreationDate>2026-02-01T00:00:00.000Z</CreationDate></Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;
        let result: ListAllMyBucketsResult = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(result.owner.id, "12345");
        assert_eq!(result.buckets.bucket.len(), 2);
        assert_eq!(result.buckets.bucket[1].name, "second");
    }
}
