//! Bucket handle and bucket-level operations.

use http::Method;
use http::header::HeaderName;
use ossify_common::{OssifyError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::decode::Sink;
use crate::object::Object;
use crate::request::{Body, CallOptions, header_value};

pub(crate) const ACL_HEADER: HeaderName = HeaderName::from_static("x-oss-acl");

/// A bucket of a client. Carries the client reference and the bucket name;
/// every operation passes the name explicitly into the request builder.
pub struct Bucket<'a> {
    client: &'a Client,
    name: String,
}

impl<'a> Bucket<'a> {
    pub(crate) fn new(client: &'a Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &'a Client {
        self.client
    }

    pub fn object(&self, key: impl Into<String>) -> Object<'a> {
        Object::new(self.client, self.name.clone(), key)
    }

    fn guard(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(OssifyError::BucketNameRequired);
        }
        Ok(())
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
            .do_request(method, Some(&self.name), None, body, opts, sink)
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
            .do_request_xml(method, Some(&self.name), None, body, opts)
            .await
    }

    /// Creates the bucket, optionally with a canned ACL and a location
    /// constraint.
    pub async fn create(
        &self,
        acl: Option<&str>,
        location: Option<&str>,
        opts: CallOptions,
    ) -> Result<()> {
        let mut opts = opts;
        if let Some(acl) = acl {
            opts = opts.with_header(ACL_HEADER, header_value(acl)?);
        }
        let body = match location {
            Some(location) => Body::xml(&CreateBucketConfiguration {
                location_constraint: location.to_string(),
            })?,
            None => Body::None,
        };
        self.do_request(Method::PUT, body, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// Deletes the bucket; the service answers `BucketNotEmpty` when it
    /// still holds objects.
    pub async fn delete(&self, opts: CallOptions) -> Result<()> {
        self.do_request(Method::DELETE, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// Lists objects. Recognized query parameters: `delimiter`, `marker`,
    /// `max-keys`, `prefix`, `encoding-type`.
    pub async fn list_objects(&self, opts: CallOptions) -> Result<ListBucketResult> {
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }

    pub async fn put_acl(&self, acl: &str, opts: CallOptions) -> Result<()> {
        let opts = opts
            .with_header(ACL_HEADER, header_value(acl)?)
            .with_query("acl", "");
        self.do_request(Method::PUT, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    pub async fn get_acl(&self, opts: CallOptions) -> Result<String> {
        let opts = opts.with_query("acl", "");
        let policy: AccessControlPolicy = self.do_request_xml(Method::GET, Body::None, &opts).await?;
        Ok(policy.access_control_list.grant)
    }

    pub async fn get_location(&self, opts: CallOptions) -> Result<String> {
        let opts = opts.with_query("location", "");
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }

    pub async fn put_logging(&self, status: &BucketLoggingStatus, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("logging", "");
        self.do_request(Method::PUT, Body::xml(status)?, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    pub async fn get_logging(&self, opts: CallOptions) -> Result<BucketLoggingStatus> {
        let opts = opts.with_query("logging", "");
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }

    pub async fn delete_logging(&self, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("logging", "");
        self.do_request(Method::DELETE, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    pub async fn put_website(&self, config: &WebsiteConfiguration, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("website", "");
        self.do_request(Method::PUT, Body::xml(config)?, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    pub async fn get_website(&self, opts: CallOptions) -> Result<WebsiteConfiguration> {
        let opts = opts.with_query("website", "");
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }

    pub async fn delete_website(&self, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("website", "");
        self.do_request(Method::DELETE, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// Sets the referer white list used to prevent hotlinking.
    pub async fn put_referer(&self, config: &RefererConfiguration, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("referer", "");
        self.do_request(Method::PUT, Body::xml(config)?, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    pub async fn get_referer(&self, opts: CallOptions) -> Result<RefererConfiguration> {
        let opts = opts.with_query("referer", "");
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }

    pub async fn put_lifecycle(
        &self,
        config: &LifecycleConfiguration,
        opts: CallOptions,
    ) -> Result<()> {
        let opts = opts.with_query("lifecycle", "");
        self.do_request(Method::PUT, Body::xml(config)?, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    pub async fn get_lifecycle(&self, opts: CallOptions) -> Result<LifecycleConfiguration> {
        let opts = opts.with_query("lifecycle", "");
        self.do_request_xml(Method::GET, Body::None, &opts).await
    }

    pub async fn delete_lifecycle(&self, opts: CallOptions) -> Result<()> {
        let opts = opts.with_query("lifecycle", "");
        self.do_request(Method::DELETE, Body::None, &opts, Sink::Discard)
            .await
            .map(|_| ())
    }

    /// Deletes up to 1000 objects in one request. Returns the deleted keys
    /// unless `quiet` is set, in which case the service omits them.
    pub async fn delete_objects(
        &self,
        keys: &[&str],
        quiet: bool,
        opts: CallOptions,
    ) -> Result<Vec<String>> {
        let opts = opts.with_query("delete", "");
        let payload = Delete {
            quiet,
            objects: keys
                .iter()
                .map(|key| DeleteObject {
                    key: (*key).to_string(),
                })
                .collect(),
        };
        let body = Body::xml(&payload)?;

        if quiet {
            self.do_request(Method::POST, body, &opts, Sink::Discard)
                .await?;
            return Ok(Vec::new());
        }

        let result: DeleteResult = self.do_request_xml(Method::POST, body, &opts).await?;
        Ok(result.deleted.into_iter().map(|entry| entry.key).collect())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "DisplayName", default)]
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessControlPolicy {
    #[serde(rename = "Owner", default)]
    pub owner: Owner,
    #[serde(rename = "AccessControlList", default)]
    pub access_control_list: AccessControlList,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessControlList {
    #[serde(rename = "Grant", default)]
    pub grant: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "CreateBucketConfiguration")]
pub struct CreateBucketConfiguration {
    #[serde(rename = "LocationConstraint")]
    pub location_constraint: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "BucketLoggingStatus")]
pub struct BucketLoggingStatus {
    #[serde(rename = "LoggingEnabled", default)]
    pub logging_enabled: LoggingEnabled,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoggingEnabled {
    #[serde(rename = "TargetBucket", default)]
    pub target_bucket: String,
    #[serde(rename = "TargetPrefix", default)]
    pub target_prefix: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "WebsiteConfiguration")]
pub struct WebsiteConfiguration {
    #[serde(rename = "IndexDocument", default)]
    pub index_document: IndexDocument,
    #[serde(rename = "ErrorDocument", default)]
    pub error_document: ErrorDocument,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IndexDocument {
    #[serde(rename = "Suffix", default)]
    pub suffix: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorDocument {
    #[serde(rename = "Key", default)]
    pub key: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "RefererConfiguration")]
pub struct RefererConfiguration {
    #[serde(rename = "AllowEmptyReferer")]
    pub allow_empty_referer: bool,
    #[serde(rename = "RefererList", default)]
    pub referer_list: RefererList,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RefererList {
    #[serde(rename = "Referer", default)]
    pub referer: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "LifecycleConfiguration")]
pub struct LifecycleConfiguration {
    #[serde(rename = "Rule", default)]
    pub rules: Vec<LifecycleRule>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LifecycleRule {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "Prefix", default)]
    pub prefix: String,
    /// `Enabled` or `Disabled`.
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Expiration", default)]
    pub expiration: LifecycleExpiration,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LifecycleExpiration {
    #[serde(rename = "Date", default, skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(rename = "Days", default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBucketResult {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Prefix", default)]
    pub prefix: String,
    #[serde(rename = "Marker", default)]
    pub marker: String,
    #[serde(rename = "MaxKeys", default)]
    pub max_keys: String,
    #[serde(rename = "Delimiter", default)]
    pub delimiter: String,
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "Contents", default)]
    pub contents: Vec<ObjectSummary>,
    #[serde(rename = "CommonPrefixes", default)]
    pub common_prefixes: Vec<CommonPrefix>,
    #[serde(rename = "NextMarker", default)]
    pub next_marker: String,
    #[serde(rename = "EncodingType", default)]
    pub encoding_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObjectSummary {
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "LastModified", default)]
    pub last_modified: String,
    #[serde(rename = "ETag", default)]
    pub etag: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "Size", default)]
    pub size: String,
    #[serde(rename = "StorageClass", default)]
    pub storage_class: String,
    #[serde(rename = "Owner", default)]
    pub owner: Owner,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommonPrefix {
    #[serde(rename = "Prefix", default)]
    pub prefix: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "Delete")]
struct Delete {
    #[serde(rename = "Quiet")]
    quiet: bool,
    #[serde(rename = "Object")]
    objects: Vec<DeleteObject>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeleteObject {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteResult {
    #[serde(rename = "Deleted", default)]
    deleted: Vec<DeleteObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_bucket_result_decodes() {
        let xml = r#"<ListBucketResult>
  <Name>bucket</Name>
  <Prefix></Prefix>
  <MaxKeys>100</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents>
    <Key>fun/movie/001.avi</Key>
    <LastModified>2026-02-05T12:00:00.000Z</LastModified>
    <ETag>"5B3C1A2E053D763E1B002CC607C5A0FE"</ETag>
    <Type>Normal</Type>
    <Size>344606</Size>
    <StorageClass>Standard</StorageClass>
    <Owner><ID>0022012</ID><DisplayName>user</DisplayName></Owner>
  </Contents>
  <CommonPrefixes><Prefix>fun/</Prefix></CommonPrefixes>
  <CommonPrefixes><Prefix>work/</Prefix></CommonPrefixes>
</ListBucketResult>"#;
        let result: ListBucketResult = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(result.name, "bucket");
        assert_eq!(result.contents.len(), 1);
        assert_eq!(result.contents[0].key, "fun/movie/001.avi");
        assert_eq!(result.contents[0].size, "344606");
        assert_eq!(result.common_prefixes.len(), 2);
    }

    #[test]
    fn delete_payload_serializes_in_wire_order() {
        let payload = Delete {
            quiet: true,
            objects: vec![
                DeleteObject {
                    key: "a.txt".to_string(),
                },
                DeleteObject {
                    key: "b.txt".to_string(),
                },
            ],
        };
        let xml = quick_xml::se::to_string(&payload).unwrap();
        assert_eq!(
            xml,
            "<Delete><Quiet>true</Quiet><Object><Key>a.txt</Key></Object><Object><Key>b.txt</Key></Object></Delete>"
        );
    }

    #[test]
    fn access_control_policy_decodes() {
        let xml = r#"<AccessControlPolicy>
  <Owner><ID>0022012</ID><DisplayName>user</DisplayName></Owner>
  <AccessControlList><Grant>public-read</Grant></AccessControlList>
</AccessControlPolicy>"#;
        let policy: AccessControlPolicy = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(policy.access_control_list.grant, "public-read");
    }
}
